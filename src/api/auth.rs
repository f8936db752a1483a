//! Auth proxy endpoints.
//!
//! - POST `/login` - Forward credentials to the Auth Service, set credential cookies
//! - POST `/signup` - Forward a signup to the Auth Service
//! - POST `/refresh` - Exchange the refresh cookie for new credential cookies

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::{error, info};

use super::error::ApiError;
use crate::auth::{REFRESH_COOKIE_NAME, append_credential_cookies, get_cookie};
use crate::auth_service::{AuthService, AuthServiceError, Credentials};
use crate::refresh::{RefreshError, RefreshOrchestrator};

#[derive(Clone)]
pub struct AuthApiState {
    pub service: Arc<dyn AuthService>,
    pub refresher: RefreshOrchestrator,
    pub secure_cookies: bool,
}

pub fn router(state: AuthApiState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/refresh", post(refresh))
        .with_state(state)
}

/// Any non-OK from the service reads as bad credentials, except "not found".
async fn login(
    State(state): State<AuthApiState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    let pair = state.service.login(&credentials).await.map_err(|e| match e {
        AuthServiceError::Rejected { status, .. } if status == StatusCode::NOT_FOUND => {
            ApiError::message(status, "User not found")
        }
        AuthServiceError::Rejected { status, .. } => ApiError::message(status, "Invalid credentials"),
        e => {
            error!(error = %e, "Login failed");
            ApiError::message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    })?;

    info!("Login successful");
    let mut response = Json(json!({ "message": "Login successful" })).into_response();
    append_credential_cookies(
        response.headers_mut(),
        &pair.access_token,
        pair.refresh_token.as_deref(),
        state.secure_cookies,
    );
    Ok(response)
}

async fn signup(
    State(state): State<AuthApiState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .service
        .signup(&credentials)
        .await
        .map(Json)
        .map_err(|e| match e {
            AuthServiceError::Rejected { status, .. } if status == StatusCode::BAD_REQUEST => {
                ApiError::error(status, "Invalid email or password")
            }
            AuthServiceError::Rejected { status, body } => ApiError::upstream(status, body),
            e => {
                error!(error = %e, "Signup failed");
                ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        })
}

async fn refresh(
    State(state): State<AuthApiState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE_NAME);

    let credentials = state
        .refresher
        .refresh(refresh_token)
        .await
        .map_err(|e| match e {
            RefreshError::NoRefreshCredential => {
                ApiError::error(StatusCode::UNAUTHORIZED, "No refresh token found")
            }
            RefreshError::ServiceRejected { status, body } => ApiError::upstream(status, body),
            e => {
                error!(error = %e, "Refresh failed");
                ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to refresh token")
            }
        })?;

    let mut response = Json(json!({ "message": "Tokens refreshed" })).into_response();
    append_credential_cookies(
        response.headers_mut(),
        &credentials.access_token,
        credentials.refresh_token.as_deref(),
        state.secure_cookies,
    );
    Ok(response)
}
