use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ErrorResponse;

/// Permission names carried in JWT claims and required per route.
pub mod consts {
    pub const READ_DEVICE: &str = "READ_DEVICE";
    pub const CREATE_DEVICE: &str = "CREATE_DEVICE";
    pub const UPDATE_DEVICE: &str = "UPDATE_DEVICE";
    pub const DELETE_DEVICE: &str = "DELETE_DEVICE";
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuth | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
            details: None,
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

/// JWT claims issued by the platform gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email
    pub sub: String,
    /// Tenant the caller belongs to
    pub organization_id: String,
    /// Permission names granted to the caller
    #[serde(default)]
    pub permissions: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

/// Authenticated caller extracted from a validated token. Handlers
/// thread `email` and `organization_id` into service calls explicitly.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub organization_id: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Validates and issues HS256 tokens.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(secret: &str, issuer: String, audience: String, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[audience.as_str()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            audience,
            token_ttl,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Issues a token for the given identity. The gateway normally
    /// issues tokens; this is used by tooling and tests.
    pub fn generate_token(
        &self,
        email: &str,
        organization_id: &str,
        permissions: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: email.to_string(),
            organization_id: organization_id.to_string(),
            permissions,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.token_ttl.as_secs() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Extracts and validates the bearer token, inserting the caller into
/// request extensions for downstream extractors.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let token = match token {
        Some(token) => token,
        None => return AuthError::MissingAuth.into_response(),
    };

    match auth_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser {
                email: claims.sub,
                organization_id: claims.organization_id,
                permissions: claims.permissions,
            });
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects callers that lack the required permission.
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingAuth)?;

    if !user.has_permission(&required_permission) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            "a-test-only-secret-that-is-long-enough-to-sign-hs256-tokens-0123456789",
            "inventory-api".into(),
            "beeja-platform".into(),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn round_trips_claims() {
        let svc = service();
        let token = svc
            .generate_token(
                "ops@example.com",
                "org-1",
                vec![consts::READ_DEVICE.to_string()],
            )
            .unwrap();

        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "ops@example.com");
        assert_eq!(claims.organization_id, "org-1");
        assert_eq!(claims.permissions, vec![consts::READ_DEVICE.to_string()]);
    }

    #[test]
    fn rejects_token_from_other_secret() {
        let other = AuthService::new(
            "another-secret-that-is-also-long-enough-to-sign-hs256-tokens-987654",
            "inventory-api".into(),
            "beeja-platform".into(),
            Duration::from_secs(3600),
        );
        let token = other
            .generate_token("ops@example.com", "org-1", vec![])
            .unwrap();

        assert!(service().validate_token(&token).is_err());
    }

    #[test]
    fn permission_check_is_exact() {
        let user = AuthUser {
            email: "ops@example.com".into(),
            organization_id: "org-1".into(),
            permissions: vec![consts::READ_DEVICE.to_string()],
        };

        assert!(user.has_permission(consts::READ_DEVICE));
        assert!(!user.has_permission(consts::DELETE_DEVICE));
    }
}
