//! Placeholder pages behind the gate.
//!
//! Real pages are rendered elsewhere. These exist so the gated paths resolve
//! and show who the gate let through.

use axum::{Extension, Router, routing::get};

use crate::jwt::Claims;

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/signup", get(signup))
        .route("/user", get(user))
        .route("/admin", get(admin))
}

async fn home() -> &'static str {
    "Welcome"
}

async fn login() -> &'static str {
    "Login"
}

async fn signup() -> &'static str {
    "Sign up"
}

async fn user(Extension(claims): Extension<Claims>) -> String {
    format!("Hello User {}", claims.subject)
}

async fn admin(Extension(claims): Extension<Claims>) -> String {
    format!("Hello Admin {}", claims.subject)
}
