//! Exchange of a refresh credential for a new credential pair.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::auth_service::{AuthService, AuthServiceError};

/// Credentials produced by a successful refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedCredentials {
    pub access_token: String,
    /// `None` means the caller keeps its current refresh credential.
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for RefreshedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedCredentials")
            .field("rotated", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no refresh token supplied")]
    NoRefreshCredential,
    /// The service refused the refresh credential (expired, invalid or revoked).
    #[error("auth service rejected refresh with status {status}")]
    ServiceRejected {
        status: StatusCode,
        body: Option<serde_json::Value>,
    },
    #[error("auth service is unreachable")]
    ServiceUnreachable,
    #[error("auth service sent an unusable refresh response")]
    InvalidResponse,
}

/// Calls the Auth Service's refresh operation. Holds no per-subject state:
/// concurrent refreshes for the same credential are independent calls.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    service: Arc<dyn AuthService>,
}

impl RefreshOrchestrator {
    pub fn new(service: Arc<dyn AuthService>) -> Self {
        Self { service }
    }

    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<RefreshedCredentials, RefreshError> {
        let refresh_token = refresh_token
            .filter(|token| !token.is_empty())
            .ok_or(RefreshError::NoRefreshCredential)?;

        let pair = self
            .service
            .refresh(refresh_token)
            .await
            .map_err(|e| match e {
                AuthServiceError::Rejected { status, body } => {
                    debug!(status = %status, "Refresh token rejected");
                    RefreshError::ServiceRejected { status, body }
                }
                AuthServiceError::Unreachable(_) => RefreshError::ServiceUnreachable,
                AuthServiceError::InvalidResponse(_) => RefreshError::InvalidResponse,
            })?;

        if pair.access_token.is_empty() {
            warn!("Auth service returned an empty access token");
            return Err(RefreshError::InvalidResponse);
        }

        let refresh_token = pair.refresh_token.filter(|token| !token.is_empty());
        info!(rotated = refresh_token.is_some(), "Credentials refreshed");

        Ok(RefreshedCredentials {
            access_token: pair.access_token,
            refresh_token,
        })
    }
}
