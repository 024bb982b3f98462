//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Username/password login and registration
//! - JWT token issuance and validation
//! - Role membership storage
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod token;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use routes::auth_routes;
pub use store::UserStore;
pub use token::TokenIssuer;
