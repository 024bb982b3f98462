//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::decode;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::models::Claims;
use crate::common::helpers::safe_token_log;
use crate::common::{ApiError, AppState};

/// Authenticated caller extractor
///
/// Validates the bearer token (signature, expiry, issuer, audience) and
/// exposes the subject claims. It deliberately does not hit the database:
/// whether the subject still exists is the handler's question, so that /me
/// can answer 404 rather than 401 for a deleted account.
#[derive(Debug)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the Extension containing the AppState
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        // Extract Bearer token from Authorization header
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let token = match token {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = if let Some(rest) = token.strip_prefix("Bearer ") {
            rest.to_string()
        } else {
            token
        };

        // Validate signature, expiry, issuer and audience in one pass
        let decoded = match decode::<Claims>(
            &bare_token,
            &app_state.token_issuer.decoding_key(),
            &app_state.token_issuer.validation(),
        ) {
            Ok(d) => d,
            Err(e) => {
                warn!(
                    error = %e,
                    token = %safe_token_log(&bare_token),
                    "JWT token validation failed"
                );
                return Err(ApiError::Unauthorized("invalid token".into()));
            }
        };

        let claims = decoded.claims;
        if claims.sub.is_empty() {
            warn!("Authentication failed: token has no subject claim");
            return Err(ApiError::Unauthorized("invalid token".into()));
        }

        debug!(user_id = %claims.sub, "Bearer token validated");

        Ok(AuthedUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
