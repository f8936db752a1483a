//! Client for the external Auth Service.
//!
//! The Auth Service owns credential issuance. This crate only forwards
//! `login`, `signup` and `refresh` calls to it over JSON/HTTP.
//!
//! - POST `{base}/login`   `{email, password}` -> `{token | access_token, refresh_token?}`
//! - POST `{base}/signup`  `{email, password}` -> any JSON
//! - POST `{base}/refresh` `{refresh_token}`   -> `{access_token, refresh_token?}`

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default timeout for Auth Service requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Email/password pair forwarded to `login` and `signup`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials minted by the Auth Service.
#[derive(Clone, Deserialize)]
#[serde(try_from = "WireTokenPair")]
pub struct TokenPair {
    pub access_token: String,
    /// Absent when the service did not rotate the refresh credential.
    pub refresh_token: Option<String>,
}

/// The login endpoint names the access credential `token`, the refresh
/// endpoint `access_token`. When both are sent, `access_token` wins.
#[derive(Deserialize)]
struct WireTokenPair {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TryFrom<WireTokenPair> for TokenPair {
    type Error = &'static str;

    fn try_from(wire: WireTokenPair) -> Result<Self, Self::Error> {
        let access_token = wire
            .access_token
            .or(wire.token)
            .ok_or("missing field `access_token`")?;
        Ok(Self {
            access_token,
            refresh_token: wire.refresh_token,
        })
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Failure talking to the Auth Service.
#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// Non-success status. `body` is the service's JSON payload, if it sent one.
    #[error("auth service rejected the request with status {status}")]
    Rejected {
        status: StatusCode,
        body: Option<serde_json::Value>,
    },
    /// Connection failure or timeout.
    #[error("auth service is unreachable: {0}")]
    Unreachable(String),
    /// Success status with a body that does not parse.
    #[error("auth service sent an invalid response: {0}")]
    InvalidResponse(String),
}

/// Operations consumed from the Auth Service.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthServiceError>;

    async fn signup(
        &self,
        credentials: &Credentials,
    ) -> Result<serde_json::Value, AuthServiceError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthServiceError>;
}

/// reqwest-backed Auth Service client.
#[derive(Clone)]
pub struct HttpAuthService {
    client: Client,
    base_url: String,
}

impl HttpAuthService {
    /// Create a client for the service at `base_url`. Every request is bounded by `timeout`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, T>(&self, endpoint: &'static str, body: &B) -> Result<T, AuthServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "cookiegate.auth_service", endpoint, error = %e, "Auth service request failed");
                AuthServiceError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<serde_json::Value>().await.ok();
            debug!(target: "cookiegate.auth_service", endpoint, status = %status, "Auth service rejected request");
            return Err(AuthServiceError::Rejected { status, body });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                warn!(target: "cookiegate.auth_service", endpoint, error = %e, "Auth service response timed out");
                AuthServiceError::Unreachable(e.to_string())
            } else {
                warn!(target: "cookiegate.auth_service", endpoint, error = %e, "Failed to parse auth service response");
                AuthServiceError::InvalidResponse(e.to_string())
            }
        })
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    #[instrument(skip_all)]
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthServiceError> {
        self.post("login", credentials).await
    }

    #[instrument(skip_all)]
    async fn signup(
        &self,
        credentials: &Credentials,
    ) -> Result<serde_json::Value, AuthServiceError> {
        self.post("signup", credentials).await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthServiceError> {
        self.post("refresh", &RefreshRequest { refresh_token }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_accepts_login_shape() {
        let pair: TokenPair = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(pair.access_token, "abc");
        assert!(pair.refresh_token.is_none());
    }

    #[test]
    fn test_token_pair_accepts_refresh_shape() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token": "abc", "refresh_token": "xyz"}"#).unwrap();
        assert_eq!(pair.access_token, "abc");
        assert_eq!(pair.refresh_token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_token_pair_with_both_names_prefers_access_token() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"token": "legacy", "access_token": "abc"}"#).unwrap();
        assert_eq!(pair.access_token, "abc");

        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token": "abc", "token": "legacy"}"#).unwrap();
        assert_eq!(pair.access_token, "abc");
    }

    #[test]
    fn test_token_pair_requires_access_token() {
        assert!(serde_json::from_str::<TokenPair>(r#"{"refresh_token": "xyz"}"#).is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            email: "a@example.com".to_string(),
            password: "hunter2".to_string(),
        };

        let debug = format!("{:?}", credentials);
        assert!(debug.contains("a@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let url = Url::parse("http://localhost:8000/").unwrap();
        let service = HttpAuthService::new(&url, Duration::from_secs(1)).unwrap();
        assert_eq!(service.base_url, "http://localhost:8000");
    }
}
