//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use clap::Parser;
use tracing::info;
use url::Url;

use crate::auth_service::DEFAULT_TIMEOUT_SECS;
use crate::config::{ConfigError, GateConfig, LandingPaths};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cookiegate",
    about = "Cookie-based authentication gate in front of an external auth service"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Base URL of the auth service issuing credentials
    #[arg(long, env = "AUTH_SERVICE_URL", default_value = "http://localhost:8000")]
    pub auth_service_url: String,

    /// Timeout for each auth service request, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub auth_timeout_secs: u64,

    /// Path to file containing the signing secret. Prefer the SECRET_KEY env var instead
    #[arg(long)]
    pub secret_key_file: Option<String>,

    /// Deployment environment. Cookies are marked Secure outside development
    #[arg(long, env = "APP_ENV", default_value = "production")]
    pub environment: Environment,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the signing secret from the SECRET_KEY environment variable or a file.
pub fn load_secret(secret_key_file: Option<&str>) -> Result<Vec<u8>, ConfigError> {
    let secret = if let Ok(secret) = std::env::var("SECRET_KEY") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("SECRET_KEY") };
        secret
    } else if let Some(path) = secret_key_file {
        std::fs::read_to_string(path).map_err(|source| ConfigError::SecretFile {
            path: path.to_string(),
            source,
        })?
    } else {
        return Err(ConfigError::MissingSecret);
    };

    let secret = secret.trim();
    if secret.is_empty() {
        return Err(ConfigError::MissingSecret);
    }

    Ok(secret.as_bytes().to_vec())
}

pub fn parse_auth_service_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::InvalidAuthServiceUrl {
        url: url.to_string(),
        source,
    })
}

/// Build GateConfig from validated arguments.
pub fn build_config(args: &Args, secret: Vec<u8>) -> Result<GateConfig, ConfigError> {
    let auth_service_url = parse_auth_service_url(&args.auth_service_url)?;
    let secure_cookies = args.environment != Environment::Development;

    info!(
        auth_service = %auth_service_url,
        environment = ?args.environment,
        secure_cookies,
        "Configuration loaded"
    );

    Ok(GateConfig {
        secret,
        secure_cookies,
        auth_service_url,
        auth_service_timeout: Duration::from_secs(args.auth_timeout_secs),
        paths: LandingPaths::default(),
    })
}

/// Load the secret and build the full configuration.
pub fn load_config(args: &Args) -> Result<GateConfig, ConfigError> {
    let secret = load_secret(args.secret_key_file.as_deref())?;
    build_config(args, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["cookiegate"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["cookiegate", "--environment", "production"]);

        assert_eq!(args.port, 3000);
        assert_eq!(args.auth_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(args.secret_key_file.is_none());
    }

    #[test]
    fn test_secure_cookies_follow_environment() {
        let dev = build_config(&args(&["--environment", "development"]), b"s".to_vec()).unwrap();
        assert!(!dev.secure_cookies);

        let prod = build_config(&args(&["--environment", "production"]), b"s".to_vec()).unwrap();
        assert!(prod.secure_cookies);
    }

    #[test]
    fn test_build_config_values() {
        let config = build_config(
            &args(&[
                "--auth-service-url",
                "http://auth.internal:9000",
                "--auth-timeout-secs",
                "3",
            ]),
            b"secret".to_vec(),
        )
        .unwrap();

        assert_eq!(config.secret, b"secret");
        assert_eq!(config.auth_service_url.as_str(), "http://auth.internal:9000/");
        assert_eq!(config.auth_service_timeout, Duration::from_secs(3));
        assert_eq!(config.paths, LandingPaths::default());
    }

    #[test]
    fn test_invalid_auth_service_url() {
        let result = build_config(&args(&["--auth-service-url", "not a url"]), b"s".to_vec());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAuthServiceUrl { .. })
        ));
    }

    #[test]
    fn test_unreadable_secret_file() {
        if std::env::var("SECRET_KEY").is_ok() {
            return;
        }
        let result = load_secret(Some("/nonexistent/cookiegate-secret"));
        assert!(matches!(result, Err(ConfigError::SecretFile { .. })));
    }

    #[test]
    fn test_secret_file_is_trimmed() {
        if std::env::var("SECRET_KEY").is_ok() {
            return;
        }
        let path = std::env::temp_dir().join(format!("cookiegate-secret-{}", std::process::id()));
        std::fs::write(&path, "  file-secret\n").unwrap();

        let secret = load_secret(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(secret, b"file-secret");
    }
}
