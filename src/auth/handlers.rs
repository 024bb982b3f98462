//! Authentication handlers

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::AuthedUser;
use super::models::{LoginRequest, RegisterRequest, StatusResponse, TokenResponse, UserInfo};
use super::store::{CreateUserError, UserStore, ROLE_ADMIN, ROLE_USER};
use crate::common::{safe_email_log, ApiError, AppState};

const MSG_USER_EXISTS: &str = "User already exists!";
const MSG_CREATION_FAILED: &str = "User creation failed! Please check user details and try again.";
const MSG_USER_CREATED: &str = "User created successfully!";

/// POST /api/authenticate/login
/// Verifies username/password and mints a bearer token
///
/// # Request Body
/// ```json
/// {
///   "username": "alice",
///   "password": "Secret1!"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "token": "<jwt token>",
///   "expiration": "2026-01-01T12:00:00Z"
/// }
/// ```
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let store = UserStore::new(state.db.clone());

    let user = store
        .find_by_username(&payload.username)
        .await
        .map_err(ApiError::DatabaseError)?;

    // Unknown user and wrong password get the same response: nothing in the
    // status code or body may let a caller enumerate usernames.
    let user = match user {
        Some(u) if store.verify_password(&u, &payload.password) => u,
        _ => {
            warn!(username = %payload.username, "Login failed");
            return Err(ApiError::Unauthorized(
                "invalid username or password".to_string(),
            ));
        }
    };

    let issued = state.token_issuer.issue(&user).map_err(|e| {
        error!(error = %e, user_id = %user.id, "JWT encoding error during login");
        ApiError::InternalServer("token signing failed".to_string())
    })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "Login successful"
    );

    Ok(Json(TokenResponse {
        token: issued.token,
        expiration: issued.expiration,
    }))
}

/// POST /api/authenticate/register
/// Creates a user account and assigns the "User" role
///
/// # Response
/// ```json
/// {
///   "status": "Success",
///   "message": "User created successfully!"
/// }
/// ```
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let store = UserStore::new(state.db.clone());

    create_account(&store, &payload, &[ROLE_USER]).await
}

/// POST /api/authenticate/register-admin
/// Creates a user account holding both "Admin" and "User" roles
///
/// Closed unless the ADMIN_REGISTRATION_OPEN bootstrap switch is on; an
/// open admin-creation endpoint is an operator decision, not a default.
pub async fn register_admin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    if !state.admin_registration_open {
        warn!(
            username = %payload.username,
            "Rejected admin registration attempt while bootstrap switch is off"
        );
        return Err(ApiError::Forbidden(
            "admin registration is closed".to_string(),
        ));
    }

    let store = UserStore::new(state.db.clone());

    create_account(&store, &payload, &[ROLE_ADMIN, ROLE_USER]).await
}

/// GET /api/authenticate/me
/// Returns the authenticated caller's account and current roles
///
/// Roles come fresh from the store, never from the token: the token carries
/// no role claims and would be stale anyway.
///
/// # Response
/// ```json
/// {
///   "id": "P_K7NP3X",
///   "userName": "alice",
///   "email": "a@x.com",
///   "roles": ["User"]
/// }
/// ```
pub async fn me(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<UserInfo>, ApiError> {
    let state = state_lock.read().await.clone();
    let store = UserStore::new(state.db.clone());

    let user = store
        .find_by_id(&authed.id)
        .await
        .map_err(ApiError::DatabaseError)?;

    // A valid token for a deleted account is NotFound, not Unauthorized:
    // the caller proved who they are; the account is simply gone.
    let user = match user {
        Some(u) => u,
        None => {
            warn!(user_id = %authed.id, "Authenticated user no longer exists");
            return Err(ApiError::NotFound("user not found".to_string()));
        }
    };

    let roles = store
        .list_roles(&user.id)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(UserInfo {
        id: user.id,
        user_name: user.username,
        email: user.email,
        roles,
    }))
}

// ---- Helper Functions ----

/// Shared registration flow: exists-check, create, ensure-and-assign roles
async fn create_account(
    store: &UserStore,
    payload: &RegisterRequest,
    roles: &[&str],
) -> Result<Json<StatusResponse>, ApiError> {
    let existing = store
        .find_by_username(&payload.username)
        .await
        .map_err(ApiError::DatabaseError)?;

    if existing.is_some() {
        return Err(ApiError::BadRequest(MSG_USER_EXISTS.to_string()));
    }

    let user = match store
        .create_user(&payload.username, &payload.email, &payload.password)
        .await
    {
        Ok(u) => u,
        // A concurrent register can slip past the exists-check; the UNIQUE
        // constraint reports it and the caller sees the same conflict.
        Err(CreateUserError::UsernameTaken) => {
            return Err(ApiError::BadRequest(MSG_USER_EXISTS.to_string()));
        }
        Err(e) => {
            error!(
                error = ?e,
                username = %payload.username,
                "User creation failed"
            );
            return Err(ApiError::BadRequest(MSG_CREATION_FAILED.to_string()));
        }
    };

    for role in roles {
        store
            .ensure_role_and_assign(&user.id, role)
            .await
            .map_err(ApiError::DatabaseError)?;
    }

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        roles = ?roles,
        "User account created"
    );

    Ok(Json(StatusResponse::success(MSG_USER_CREATED)))
}
