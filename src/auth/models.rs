//! Authentication data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims structure
///
/// Role claims are intentionally absent: tokens identify the subject, they
/// do not carry authorization. Consumers needing roles must ask the server
/// (see the /me handler, which reads them fresh from the store).
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    /// Subject: the user's id
    pub sub: String,
    pub email: String,
    /// Unique token id
    pub jti: String,
    pub iss: String,
    pub aud: String,
    /// Expiration as a unix timestamp
    pub exp: usize,
}

/// POST /api/authenticate/login request body
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/authenticate/register request body
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Successful login response
#[derive(Serialize, Debug)]
pub struct TokenResponse {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

/// Registration outcome body
#[derive(Serialize, Debug)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: &str) -> Self {
        StatusResponse {
            status: "Success".to_string(),
            message: message.to_string(),
        }
    }
}

/// GET /api/authenticate/me response body
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub roles: Vec<String>,
}
