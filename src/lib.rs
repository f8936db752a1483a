pub mod api;
pub mod auth;
pub mod auth_service;
pub mod cli;
pub mod config;
pub mod gate;
pub mod jwt;
pub mod pages;
pub mod refresh;
pub mod routes;

use api::create_api_router;
use auth_service::{AuthService, HttpAuthService};
use axum::{Router, middleware};
use config::{ConfigError, GateConfig};
use gate::{GateController, gate_request};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the application router, talking to the Auth Service over HTTP.
pub fn create_app(config: &GateConfig) -> Result<Router, ConfigError> {
    let service = HttpAuthService::new(&config.auth_service_url, config.auth_service_timeout)?;
    Ok(create_app_with_service(config, Arc::new(service)))
}

/// Create the application router around any Auth Service implementation.
pub fn create_app_with_service(config: &GateConfig, service: Arc<dyn AuthService>) -> Router {
    let gate = Arc::new(GateController::new(config, service.clone()));

    let api_router = create_api_router(
        service,
        gate.refresher().clone(),
        config.secure_cookies,
    );

    Router::new()
        .merge(pages::router())
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(gate, gate_request))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: GateConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config).map_err(std::io::Error::other)?;
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: GateConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
