//! Gate configuration, built once at startup and passed in explicitly.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth_service::DEFAULT_TIMEOUT_SECS;
use crate::jwt::Role;

/// Where the gate sends people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingPaths {
    pub login: String,
    pub user: String,
    pub admin: String,
}

impl LandingPaths {
    /// Landing page for an authenticated visitor with `role`.
    pub fn landing_for(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin,
            Role::User => &self.user,
        }
    }
}

impl Default for LandingPaths {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            user: "/user".to_string(),
            admin: "/admin".to_string(),
        }
    }
}

pub struct GateConfig {
    /// Secret used to verify access tokens (shared with the Auth Service)
    pub secret: Vec<u8>,
    /// Whether to set Secure flag on cookies (off only for local development)
    pub secure_cookies: bool,
    /// Base URL of the Auth Service
    pub auth_service_url: Url,
    /// Timeout for each outbound Auth Service call
    pub auth_service_timeout: Duration,
    pub paths: LandingPaths,
}

impl GateConfig {
    /// Configuration with default paths and timeout.
    pub fn new(secret: impl Into<Vec<u8>>, auth_service_url: Url, secure_cookies: bool) -> Self {
        Self {
            secret: secret.into(),
            secure_cookies,
            auth_service_url,
            auth_service_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            paths: LandingPaths::default(),
        }
    }
}

/// Fatal startup errors. None of these are handled per request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "SECRET_KEY is required. Set the SECRET_KEY environment variable or use --secret-key-file"
    )]
    MissingSecret,
    #[error("failed to read secret key file {path}: {source}")]
    SecretFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid auth service URL {url}: {source}")]
    InvalidAuthServiceUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build auth service client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_for_role() {
        let paths = LandingPaths::default();

        assert_eq!(paths.landing_for(Role::Admin), "/admin");
        assert_eq!(paths.landing_for(Role::User), "/user");
        assert_eq!(paths.login, "/login");
    }

    #[test]
    fn test_missing_secret_message() {
        let message = ConfigError::MissingSecret.to_string();
        assert!(message.contains("SECRET_KEY") && message.contains("required"));
    }
}
