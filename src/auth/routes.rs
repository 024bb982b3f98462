//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/authenticate/login` - Username/password login, returns a bearer token
/// - `POST /api/authenticate/register` - Create a user account
/// - `POST /api/authenticate/register-admin` - Create an administrator account (bootstrap-gated)
/// - `GET /api/authenticate/me` - Get current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/authenticate/login", post(handlers::login))
        .route("/api/authenticate/register", post(handlers::register))
        .route(
            "/api/authenticate/register-admin",
            post(handlers::register_admin),
        )
        .route("/api/authenticate/me", get(handlers::me))
}
