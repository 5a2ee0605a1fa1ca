use crate::entities::device::{self, Availability};
use crate::errors::ServiceError;
use crate::services::inventory::{DeviceFilter, DeviceUpdate, NewDevice};
use crate::{auth::AuthUser, AppState, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Device record as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceResponse {
    pub id: Uuid,
    pub device: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub specifications: Option<String>,
    pub ram: Option<String>,
    pub availability: Availability,
    pub product_id: Option<String>,
    pub price: Option<Decimal>,
    pub date_of_purchase: Option<NaiveDate>,
    pub comments: Option<String>,
    pub accessory_type: Option<String>,
    pub device_number: String,
    pub organization_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<device::Model> for DeviceResponse {
    fn from(model: device::Model) -> Self {
        Self {
            id: model.id,
            device: model.device,
            provider: model.provider,
            model: model.model,
            device_type: model.device_type,
            os: model.os,
            specifications: model.specifications,
            ram: model.ram,
            availability: model.availability,
            product_id: model.product_id,
            price: model.price,
            date_of_purchase: model.date_of_purchase,
            comments: model.comments,
            accessory_type: model.accessory_type,
            device_number: model.device_number,
            organization_id: model.organization_id,
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddDeviceRequest {
    /// Device name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Device name must be between 1 and 255 characters"
    ))]
    pub device: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub specifications: Option<String>,
    pub ram: Option<String>,
    pub availability: Availability,
    #[validate(length(max = 100, message = "Product ID cannot exceed 100 characters"))]
    pub product_id: Option<String>,
    pub price: Option<Decimal>,
    pub date_of_purchase: Option<NaiveDate>,
    #[validate(length(max = 2000, message = "Comments cannot exceed 2000 characters"))]
    pub comments: Option<String>,
    pub accessory_type: Option<String>,
}

impl From<AddDeviceRequest> for NewDevice {
    fn from(req: AddDeviceRequest) -> Self {
        Self {
            device: req.device,
            provider: req.provider,
            model: req.model,
            device_type: req.device_type,
            os: req.os,
            specifications: req.specifications,
            ram: req.ram,
            availability: req.availability,
            product_id: req.product_id,
            price: req.price,
            date_of_purchase: req.date_of_purchase,
            comments: req.comments,
            accessory_type: req.accessory_type,
        }
    }
}

/// Sparse update: absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDeviceRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Device name must be between 1 and 255 characters"
    ))]
    pub device: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub specifications: Option<String>,
    pub ram: Option<String>,
    pub availability: Option<Availability>,
    #[validate(length(max = 100, message = "Product ID cannot exceed 100 characters"))]
    pub product_id: Option<String>,
    pub price: Option<Decimal>,
    pub date_of_purchase: Option<NaiveDate>,
    #[validate(length(max = 2000, message = "Comments cannot exceed 2000 characters"))]
    pub comments: Option<String>,
    pub accessory_type: Option<String>,
}

impl From<UpdateDeviceRequest> for DeviceUpdate {
    fn from(req: UpdateDeviceRequest) -> Self {
        Self {
            device: req.device,
            provider: req.provider,
            model: req.model,
            device_type: req.device_type,
            os: req.os,
            specifications: req.specifications,
            ram: req.ram,
            availability: req.availability,
            product_id: req.product_id,
            price: req.price,
            date_of_purchase: req.date_of_purchase,
            comments: req.comments,
            accessory_type: req.accessory_type,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceFilters {
    pub device: Option<String>,
    pub provider: Option<String>,
    pub availability: Option<Availability>,
    pub os: Option<String>,
    pub ram: Option<String>,
    /// Matched against the device number
    pub search_term: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

const MAX_PAGE_SIZE: u64 = 100;

/// List the caller's organization devices with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    params(DeviceFilters),
    responses(
        (status = 200, description = "Device list returned", body = PaginatedResponse<DeviceResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filters): Query<DeviceFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = filters.page.max(1);
    let limit = filters.limit.clamp(1, MAX_PAGE_SIZE);

    let filter = DeviceFilter {
        device: filters.device,
        provider: filters.provider,
        availability: filters.availability,
        os: filters.os,
        ram: filters.ram,
        search_term: filters.search_term,
    };

    let (devices, total) = state
        .inventory_service
        .list_devices(&user.organization_id, filter, page, limit)
        .await?;

    let response = PaginatedResponse {
        items: devices.into_iter().map(DeviceResponse::from).collect(),
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Register a new device
#[utoipa::path(
    post,
    path = "/api/v1/devices",
    request_body = AddDeviceRequest,
    responses(
        (status = 201, description = "Device created", body = DeviceResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product ID already exists", body = crate::errors::ErrorResponse),
        (status = 502, description = "Accounts service unavailable", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "devices"
)]
pub async fn add_device(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddDeviceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let device = state
        .inventory_service
        .add_device(payload.into(), &user.organization_id, &user.email)
        .await?;

    Ok((StatusCode::CREATED, Json(DeviceResponse::from(device))))
}

/// Partially update an existing device
#[utoipa::path(
    put,
    path = "/api/v1/devices/{id}",
    params(("id" = Uuid, Path, description = "Device ID")),
    request_body = UpdateDeviceRequest,
    responses(
        (status = 200, description = "Device updated", body = DeviceResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product ID already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "devices"
)]
pub async fn update_device(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeviceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let device = state
        .inventory_service
        .update_device_details(payload.into(), id, &user.organization_id)
        .await?;

    Ok((StatusCode::OK, Json(DeviceResponse::from(device))))
}

/// Delete a device, returning its prior state
#[utoipa::path(
    delete,
    path = "/api/v1/devices/{id}",
    params(("id" = Uuid, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Device deleted", body = DeviceResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "devices"
)]
pub async fn delete_device(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let device = state
        .inventory_service
        .delete_device(id, &user.organization_id)
        .await?;

    Ok((StatusCode::OK, Json(DeviceResponse::from(device))))
}
