//! JWT verification and issuance.
//!
//! Access and refresh credentials share one HMAC secret and one claim shape:
//! `sub`, `role`, `exp`. A refresh credential carries the role `"Refresh"`,
//! which is how the verifier refuses to accept one in place of an access
//! credential.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role string carried by refresh credentials.
const REFRESH_ROLE: &str = "Refresh";

/// Access token duration: 1 hour
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// Refresh token duration: 2 weeks
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 14 * 24 * 60 * 60;

/// User role carried in access credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Anything other than `"Admin"` is a plain user.
    pub fn from_claim(role: &str) -> Self {
        match role {
            "Admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims as they appear on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    role: String,
    exp: u64,
}

/// Verified access credential claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id)
    pub subject: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub expires_at: u64,
}

/// Why an access credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("refresh token presented as access token")]
    WrongTokenType,
}

/// Errors that can occur while issuing a token.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Current Unix time in seconds.
///
/// A clock set before the epoch yields `u64::MAX` so that every token reads as expired.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(u64::MAX)
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Expiry is checked against an injectable clock in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify an access credential against the system clock.
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        self.verify_at(token, unix_now())
    }

    /// Verify an access credential as of `now` (Unix seconds).
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, VerificationError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    VerificationError::BadSignature
                }
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                _ => VerificationError::Malformed,
            })?;

        let claims = data.claims;
        if now >= claims.exp {
            return Err(VerificationError::Expired);
        }
        if claims.role == REFRESH_ROLE {
            return Err(VerificationError::WrongTokenType);
        }

        Ok(Claims {
            subject: claims.sub,
            role: Role::from_claim(&claims.role),
            expires_at: claims.exp,
        })
    }

    /// Issue an access credential valid for one hour from now.
    pub fn issue_access(&self, subject: &str, role: Role) -> Result<IssuedToken, IssueError> {
        self.issue_access_at(subject, role, unix_now())
    }

    /// Issue an access credential as if issued at `issued_at`.
    pub fn issue_access_at(
        &self,
        subject: &str,
        role: Role,
        issued_at: u64,
    ) -> Result<IssuedToken, IssueError> {
        self.sign(subject, role.as_str(), issued_at, ACCESS_TOKEN_DURATION_SECS)
    }

    /// Issue a refresh credential valid for two weeks from now.
    pub fn issue_refresh(&self, subject: &str) -> Result<IssuedToken, IssueError> {
        self.issue_refresh_at(subject, unix_now())
    }

    pub fn issue_refresh_at(&self, subject: &str, issued_at: u64) -> Result<IssuedToken, IssueError> {
        self.sign(subject, REFRESH_ROLE, issued_at, REFRESH_TOKEN_DURATION_SECS)
    }

    fn sign(
        &self,
        subject: &str,
        role: &str,
        issued_at: u64,
        duration: u64,
    ) -> Result<IssuedToken, IssueError> {
        let expires_at = issued_at.saturating_add(duration);
        let claims = WireClaims {
            sub: subject.to_string(),
            role: role.to_string(),
            exp: expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            expires_at,
            duration,
        })
    }
}
