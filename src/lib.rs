//! Inventory API Library
//!
//! Organization-scoped device inventory: generated device numbers,
//! partial updates, and a permission-gated REST surface.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::AuthRouterExt;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub inventory_service: services::inventory::InventoryService,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// The v1 API surface, permission-gated per route group.
pub fn api_v1_routes() -> Router<AppState> {
    let devices_read = Router::new()
        .route("/devices", get(handlers::devices::list_devices))
        .with_permission(perm::READ_DEVICE);

    let devices_create = Router::new()
        .route(
            "/devices",
            axum::routing::post(handlers::devices::add_device),
        )
        .with_permission(perm::CREATE_DEVICE);

    let devices_update = Router::new()
        .route(
            "/devices/:id",
            axum::routing::put(handlers::devices::update_device),
        )
        .with_permission(perm::UPDATE_DEVICE);

    let devices_delete = Router::new()
        .route(
            "/devices/:id",
            axum::routing::delete(handlers::devices::delete_device),
        )
        .with_permission(perm::DELETE_DEVICE);

    Router::new()
        .merge(devices_read)
        .merge(devices_create)
        .merge(devices_update)
        .merge(devices_delete)
}
