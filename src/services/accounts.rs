use crate::errors::ServiceError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Pattern type under which the accounts service stores the device-id
/// configuration for an organization.
pub const DEVICE_ID_PATTERN: &str = "DEVICE_ID_PATTERN";

/// Identifier pattern configured per organization in the accounts
/// service: a prefix plus the total length of the generated id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPattern {
    pub prefix: Option<String>,
    pub pattern_length: usize,
}

/// Outcome of a pattern lookup. "Not configured" is an ordinary
/// answer, not an error; only transport-level failures are errors.
#[derive(Debug, Clone)]
pub enum PatternLookup {
    Configured(OrganizationPattern),
    NotConfigured,
}

/// HTTP client for the sibling accounts service.
#[derive(Debug, Clone)]
pub struct AccountClient {
    client: reqwest::Client,
    base_url: String,
}

impl AccountClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!(
                    "Failed to build accounts HTTP client: {}",
                    e
                ))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the organization's active identifier pattern of the
    /// given type.
    ///
    /// A 404 (or empty 204) means the organization simply has no
    /// pattern configured and maps to `PatternLookup::NotConfigured`.
    /// Connection failures, other non-success statuses, and
    /// undecodable bodies surface as `ExternalServiceError`.
    #[instrument(skip(self))]
    pub async fn get_active_pattern_by_type(
        &self,
        organization_id: &str,
        pattern_type: &str,
    ) -> Result<PatternLookup, ServiceError> {
        let url = format!("{}/v1/id-patterns/active", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("patternType", pattern_type)])
            .header("X-Organization-Id", organization_id)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("Accounts service unreachable: {}", e))
            })?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(PatternLookup::NotConfigured),
            status if status.is_success() => {
                let pattern = response.json::<OrganizationPattern>().await.map_err(|e| {
                    ServiceError::ExternalServiceError(format!(
                        "Accounts service returned an undecodable pattern: {}",
                        e
                    ))
                })?;
                Ok(PatternLookup::Configured(pattern))
            }
            status => Err(ServiceError::ExternalServiceError(format!(
                "Accounts service returned {} for pattern lookup",
                status
            ))),
        }
    }
}
