// Application state shared across all modules

use sqlx::SqlitePool;

use crate::auth::token::TokenIssuer;

/// Application state containing the database pool and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub token_issuer: TokenIssuer,
    /// Bootstrap switch for the register-admin endpoint. Off by default;
    /// operators enable it once to create the first administrator.
    pub admin_registration_open: bool,
}
