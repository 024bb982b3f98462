//! Token issuer
//!
//! Mints signed, time-bounded bearer tokens for authenticated players and
//! provides the matching validation rules for the extractor. The signing
//! key, issuer and audience come from [`JwtConfig`], injected once at
//! construction - handlers never read configuration ambiently.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::models::Claims;
use crate::common::JwtConfig;
use crate::game::Player;

/// Fixed validity window for issued tokens
const TOKEN_LIFETIME_HOURS: i64 = 3;

/// A freshly minted token together with its expiry
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

/// Issues and describes-how-to-validate HS256 bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        TokenIssuer { config }
    }

    /// Mint a token for a verified user. Expiry is exactly three hours from
    /// issuance; each token carries a fresh `jti`.
    pub fn issue(&self, user: &Player) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let expiration = Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: expiration.timestamp() as usize,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )?;

        Ok(IssuedToken { token, expiration })
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.config.secret.as_bytes())
    }

    /// Validation rules matching what `issue` signs: HS256 with the
    /// configured issuer and audience pinned.
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation
    }
}
