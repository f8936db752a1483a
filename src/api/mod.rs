mod auth;
mod error;

use axum::Router;
use std::sync::Arc;

use crate::auth_service::AuthService;
use crate::refresh::RefreshOrchestrator;

pub use auth::AuthApiState;
pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(
    service: Arc<dyn AuthService>,
    refresher: RefreshOrchestrator,
    secure_cookies: bool,
) -> Router {
    auth::router(AuthApiState {
        service,
        refresher,
        secure_cookies,
    })
}
