//! JWT signing configuration
//!
//! Read once at startup and injected into the token issuer. A missing or
//! empty secret is a process-level misconfiguration: startup must fail
//! rather than issue tokens nobody can verify.

use std::env;

/// Signing configuration for issued bearer tokens
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: &str, issuer: &str, audience: &str) -> anyhow::Result<Self> {
        if secret.trim().is_empty() {
            anyhow::bail!("JWT secret must be set and non-empty");
        }
        Ok(JwtConfig {
            secret: secret.to_string(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        })
    }

    /// Reads `JWT_SECRET`, `JWT_VALID_ISSUER` and `JWT_VALID_AUDIENCE`.
    /// Issuer and audience have defaults; the secret does not.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = env::var("JWT_SECRET").unwrap_or_default();
        let issuer =
            env::var("JWT_VALID_ISSUER").unwrap_or_else(|_| "citadel-api".to_string());
        let audience =
            env::var("JWT_VALID_AUDIENCE").unwrap_or_else(|_| "citadel-clients".to_string());
        JwtConfig::new(&secret, &issuer, &audience)
    }
}
