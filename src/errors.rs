use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Standardized error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "Device with ID 550e8400-e29b-41d4-a716-446655440000 not found",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2025-06-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Device with ID 550e8400-e29b-41d4-a716-446655440000 not found")]
    pub message: String,
    /// Additional error details (validation messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Which store operation a wrapped database failure came from.
///
/// Callers can rely on the code being stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbOperation {
    Fetch,
    Save,
    Delete,
}

impl std::fmt::Display for DbOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            DbOperation::Fetch => "fetch",
            DbOperation::Save => "save",
            DbOperation::Delete => "delete",
        };
        f.write_str(code)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Generic wrapped store failure. Kept distinct from the domain
    /// errors so callers can tell a business-rule violation from an
    /// infrastructure failure.
    #[error("Database error during {operation}: {source}")]
    DatabaseError {
        operation: DbOperation,
        #[source]
        source: DbErr,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate data: {0}")]
    DuplicateData(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The accounts service (or another upstream dependency) was
    /// unreachable or returned something undecodable.
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Event error: {0}")]
    EventError(String),
}

impl ServiceError {
    pub fn fetch_error(source: DbErr) -> Self {
        ServiceError::DatabaseError {
            operation: DbOperation::Fetch,
            source,
        }
    }

    pub fn save_error(source: DbErr) -> Self {
        ServiceError::DatabaseError {
            operation: DbOperation::Save,
            source,
        }
    }

    pub fn delete_error(source: DbErr) -> Self {
        ServiceError::DatabaseError {
            operation: DbOperation::Delete,
            source,
        }
    }

    /// Returns the HTTP status code for this error.
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError { .. } | Self::EventError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateData(_) => StatusCode::CONFLICT,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Returns the message exposed over HTTP. Infrastructure failures
    /// get a generic message so internals never leak to clients.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError { operation, .. } => {
                format!("Database error during {}", operation)
            }
            Self::EventError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_message() {
        let err = ServiceError::DuplicateData("Product ID P-1 already exists".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            err.response_message(),
            "Duplicate data: Product ID P-1 already exists"
        );
    }

    #[test]
    fn database_errors_expose_operation_but_not_internals() {
        let err = ServiceError::save_error(DbErr::Custom("sqlx: pool timed out".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response_message(), "Database error during save");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ServiceError::NotFound("Device X".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
