use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Availability state of a device within an organization's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    #[sea_orm(string_value = "AVAILABLE")]
    Available,
    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,
    #[sea_orm(string_value = "IN_REPAIR")]
    InRepair,
}

/// Device inventory record, scoped to one organization.
///
/// `product_id` is globally unique across the store when present.
/// `device_number` is generated at creation time and unique within an
/// organization (enforced by a unique index).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Device name (e.g. "MacBook Pro 14")
    pub device: String,

    /// Vendor or supplier
    pub provider: Option<String>,

    pub model: Option<String>,

    /// Device category (laptop, monitor, phone, ...)
    pub device_type: Option<String>,

    /// Operating system
    pub os: Option<String>,

    /// Free-text hardware specification
    pub specifications: Option<String>,

    pub ram: Option<String>,

    pub availability: Availability,

    /// External product identifier, unique across all organizations
    pub product_id: Option<String>,

    pub price: Option<Decimal>,

    pub date_of_purchase: Option<Date>,

    pub comments: Option<String>,

    pub accessory_type: Option<String>,

    /// Generated, organization-scoped identifier
    pub device_number: String,

    /// Tenant boundary for every query against this table
    pub organization_id: String,

    /// Email of the user who created the record
    pub created_by: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
