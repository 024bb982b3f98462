//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT token issuance and validation
//! - Credential store behavior (uniqueness, password verification, roles)
//! - Handler behavior (login uniformity, register conflicts, /me lookups)

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::{ApiError, AppState, JwtConfig};
    use crate::game::Player;
    use axum::extract::{Extension, Json};
    use chrono::Utc;
    use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    const TEST_SECRET: &str = "test_secret_key";
    const TEST_ISSUER: &str = "citadel-api";
    const TEST_AUDIENCE: &str = "citadel-clients";

    fn test_issuer() -> TokenIssuer {
        let config = JwtConfig::new(TEST_SECRET, TEST_ISSUER, TEST_AUDIENCE)
            .expect("test config should be valid");
        TokenIssuer::new(config)
    }

    fn sample_player() -> Player {
        Player {
            id: "P_K7NP3X".to_string(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "irrelevant-here".to_string(),
            security_stamp: "stamp".to_string(),
            created_at: None,
        }
    }

    async fn test_pool() -> SqlitePool {
        // Single connection: each :memory: connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        crate::common::migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    async fn test_state(admin_registration_open: bool) -> Arc<RwLock<AppState>> {
        let state = AppState {
            db: test_pool().await,
            token_issuer: test_issuer(),
            admin_registration_open,
        };
        Arc::new(RwLock::new(state))
    }

    fn register_payload(username: &str, email: &str, password: &str) -> models::RegisterRequest {
        models::RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Token issuer
    // ------------------------------------------------------------------

    #[test]
    fn test_claims_structure() {
        let claims = models::Claims {
            sub: "P_K7NP3X".to_string(),
            email: "a@x.com".to_string(),
            jti: "token-id".to_string(),
            iss: TEST_ISSUER.to_string(),
            aud: TEST_AUDIENCE.to_string(),
            exp: 1234567890,
        };

        assert_eq!(claims.sub, "P_K7NP3X");
        assert_eq!(claims.exp, 1234567890);
    }

    #[test]
    fn test_issued_token_round_trip() {
        let issuer = test_issuer();
        let issued = issuer.issue(&sample_player()).expect("Failed to issue token");

        let decoded = decode::<models::Claims>(
            &issued.token,
            &issuer.decoding_key(),
            &issuer.validation(),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "P_K7NP3X");
        assert_eq!(decoded.claims.email, "a@x.com");
        assert_eq!(decoded.claims.iss, TEST_ISSUER);
        assert_eq!(decoded.claims.aud, TEST_AUDIENCE);
        assert_eq!(decoded.claims.exp as i64, issued.expiration.timestamp());
    }

    #[test]
    fn test_token_expiry_is_exactly_three_hours() {
        let before = Utc::now();
        let issued = test_issuer()
            .issue(&sample_player())
            .expect("Failed to issue token");
        let after = Utc::now();

        let lifetime_from_before = (issued.expiration - before).num_seconds();
        let lifetime_from_after = (issued.expiration - after).num_seconds();

        // within clock resolution of issue-time + 3h
        assert!(lifetime_from_before <= 3 * 3600);
        assert!(lifetime_from_after >= 3 * 3600 - 5);
    }

    #[test]
    fn test_token_rejected_under_wrong_secret() {
        let issuer = test_issuer();
        let issued = issuer.issue(&sample_player()).expect("Failed to issue token");

        let result = decode::<models::Claims>(
            &issued.token,
            &DecodingKey::from_secret(b"some_other_secret"),
            &issuer.validation(),
        );

        assert!(
            result.is_err(),
            "Token validation should fail with wrong secret"
        );
    }

    #[test]
    fn test_token_rejected_under_wrong_audience() {
        let issuer = test_issuer();
        let issued = issuer.issue(&sample_player()).expect("Failed to issue token");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TEST_ISSUER]);
        validation.set_audience(&["some-other-audience"]);

        let result = decode::<models::Claims>(
            &issued.token,
            &issuer.decoding_key(),
            &validation,
        );

        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::InvalidAudience
        ));
    }

    #[test]
    fn test_each_token_gets_a_fresh_jti() {
        let issuer = test_issuer();
        let player = sample_player();

        let first = issuer.issue(&player).expect("Failed to issue token");
        let second = issuer.issue(&player).expect("Failed to issue token");

        let first_claims = decode::<models::Claims>(
            &first.token,
            &issuer.decoding_key(),
            &issuer.validation(),
        )
        .unwrap()
        .claims;
        let second_claims = decode::<models::Claims>(
            &second.token,
            &issuer.decoding_key(),
            &issuer.validation(),
        )
        .unwrap()
        .claims;

        assert_ne!(first_claims.jti, second_claims.jti);
    }

    #[test]
    fn test_empty_secret_is_a_configuration_error() {
        assert!(JwtConfig::new("", TEST_ISSUER, TEST_AUDIENCE).is_err());
        assert!(JwtConfig::new("   ", TEST_ISSUER, TEST_AUDIENCE).is_err());
    }

    // ------------------------------------------------------------------
    // Credential store
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_user_then_duplicate_username_conflicts() {
        let store = UserStore::new(test_pool().await);

        let created = store
            .create_user("alice", "a@x.com", "Secret1!")
            .await
            .expect("First registration should succeed");
        assert!(created.id.starts_with("P_"));
        assert!(!created.security_stamp.is_empty());

        // Same username, different email and password: still a conflict
        let result = store.create_user("alice", "b@y.com", "Other2!").await;
        assert!(matches!(result, Err(store::CreateUserError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_password_verification() {
        let store = UserStore::new(test_pool().await);
        let user = store
            .create_user("alice", "a@x.com", "Secret1!")
            .await
            .expect("Registration should succeed");

        assert!(store.verify_password(&user, "Secret1!"));
        assert!(!store.verify_password(&user, "wrong"));
        // Stored value is a hash, not the password
        assert_ne!(user.password_hash, "Secret1!");
    }

    #[tokio::test]
    async fn test_find_by_username_and_id() {
        let store = UserStore::new(test_pool().await);
        let user = store
            .create_user("alice", "a@x.com", "Secret1!")
            .await
            .expect("Registration should succeed");

        let by_name = store.find_by_username("alice").await.unwrap();
        assert_eq!(by_name.unwrap().id, user.id);

        let by_id = store.find_by_id(&user.id).await.unwrap();
        assert_eq!(by_id.unwrap().username, "alice");

        assert!(store.find_by_username("nobody").await.unwrap().is_none());
        assert!(store.find_by_id("P_MISSING").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_role_creation_is_idempotent() {
        let store = UserStore::new(test_pool().await);

        assert!(!store.role_exists(store::ROLE_USER).await.unwrap());
        store.create_role(store::ROLE_USER).await.unwrap();
        assert!(store.role_exists(store::ROLE_USER).await.unwrap());

        // Creating an existing role is a no-op
        store.create_role(store::ROLE_USER).await.unwrap();
        assert!(store.role_exists(store::ROLE_USER).await.unwrap());
    }

    #[tokio::test]
    async fn test_role_assignment_lists_fresh_memberships() {
        let store = UserStore::new(test_pool().await);
        let user = store
            .create_user("alice", "a@x.com", "Secret1!")
            .await
            .expect("Registration should succeed");

        assert!(store.list_roles(&user.id).await.unwrap().is_empty());

        store
            .ensure_role_and_assign(&user.id, store::ROLE_USER)
            .await
            .unwrap();
        assert_eq!(store.list_roles(&user.id).await.unwrap(), vec!["User"]);

        store
            .ensure_role_and_assign(&user.id, store::ROLE_ADMIN)
            .await
            .unwrap();
        assert_eq!(
            store.list_roles(&user.id).await.unwrap(),
            vec!["Admin", "User"]
        );
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_register_succeeds_once_then_conflicts() {
        let state = test_state(false).await;

        let ok = handlers::register(
            Extension(state.clone()),
            Json(register_payload("alice", "a@x.com", "Secret1!")),
        )
        .await
        .expect("First registration should succeed");
        assert_eq!(ok.0.status, "Success");

        let err = handlers::register(
            Extension(state.clone()),
            Json(register_payload("alice", "b@y.com", "Other2!")),
        )
        .await
        .expect_err("Second registration should conflict");

        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "User already exists!"),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_assigns_exactly_the_user_role() {
        let state = test_state(false).await;

        handlers::register(
            Extension(state.clone()),
            Json(register_payload("alice", "a@x.com", "Secret1!")),
        )
        .await
        .expect("Registration should succeed");

        let db = state.read().await.db.clone();
        let store = UserStore::new(db);
        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(store.list_roles(&user.id).await.unwrap(), vec!["User"]);
    }

    #[tokio::test]
    async fn test_register_admin_assigns_admin_and_user_roles() {
        let state = test_state(true).await;

        handlers::register_admin(
            Extension(state.clone()),
            Json(register_payload("root", "r@x.com", "Secret1!")),
        )
        .await
        .expect("Admin registration should succeed with the switch on");

        let db = state.read().await.db.clone();
        let store = UserStore::new(db);
        let user = store.find_by_username("root").await.unwrap().unwrap();
        assert_eq!(
            store.list_roles(&user.id).await.unwrap(),
            vec!["Admin", "User"]
        );
    }

    #[tokio::test]
    async fn test_register_admin_is_forbidden_when_switch_is_off() {
        let state = test_state(false).await;

        let err = handlers::register_admin(
            Extension(state.clone()),
            Json(register_payload("root", "r@x.com", "Secret1!")),
        )
        .await
        .expect_err("Admin registration should be closed by default");

        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_login_issues_token_for_valid_credentials() {
        let state = test_state(false).await;

        handlers::register(
            Extension(state.clone()),
            Json(register_payload("alice", "a@x.com", "Secret1!")),
        )
        .await
        .expect("Registration should succeed");

        let response = handlers::login(
            Extension(state.clone()),
            Json(models::LoginRequest {
                username: "alice".to_string(),
                password: "Secret1!".to_string(),
            }),
        )
        .await
        .expect("Login should succeed");

        assert!(!response.0.token.is_empty());
        assert!(response.0.expiration > Utc::now());
    }

    #[tokio::test]
    async fn test_login_failure_is_uniform_for_unknown_user_and_bad_password() {
        let state = test_state(false).await;

        handlers::register(
            Extension(state.clone()),
            Json(register_payload("alice", "a@x.com", "Secret1!")),
        )
        .await
        .expect("Registration should succeed");

        let unknown_user = handlers::login(
            Extension(state.clone()),
            Json(models::LoginRequest {
                username: "mallory".to_string(),
                password: "Secret1!".to_string(),
            }),
        )
        .await
        .expect_err("Unknown user must not log in");

        let bad_password = handlers::login(
            Extension(state.clone()),
            Json(models::LoginRequest {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .expect_err("Wrong password must not log in");

        // Same variant, same message: responses must not let a caller
        // distinguish unknown users from wrong passwords
        let msg_a = match unknown_user {
            ApiError::Unauthorized(msg) => msg,
            other => panic!("Expected Unauthorized, got {:?}", other),
        };
        let msg_b = match bad_password {
            ApiError::Unauthorized(msg) => msg,
            other => panic!("Expected Unauthorized, got {:?}", other),
        };
        assert_eq!(msg_a, msg_b);
    }

    #[tokio::test]
    async fn test_me_returns_account_with_fresh_roles() {
        let state = test_state(false).await;

        handlers::register(
            Extension(state.clone()),
            Json(register_payload("alice", "a@x.com", "Secret1!")),
        )
        .await
        .expect("Registration should succeed");

        let db = state.read().await.db.clone();
        let store = UserStore::new(db);
        let user = store.find_by_username("alice").await.unwrap().unwrap();

        // Grant a role after registration; /me must see it even though no
        // token was reissued
        store
            .ensure_role_and_assign(&user.id, store::ROLE_ADMIN)
            .await
            .unwrap();

        let authed = extractors::AuthedUser {
            id: user.id.clone(),
            email: user.email.clone(),
        };
        let info = handlers::me(Extension(state.clone()), authed)
            .await
            .expect("Lookup should succeed");

        assert_eq!(info.0.id, user.id);
        assert_eq!(info.0.user_name, "alice");
        assert_eq!(info.0.roles, vec!["Admin", "User"]);
    }

    #[tokio::test]
    async fn test_me_for_vanished_user_is_not_found() {
        let state = test_state(false).await;

        let authed = extractors::AuthedUser {
            id: "P_MISSING".to_string(),
            email: "ghost@x.com".to_string(),
        };
        let err = handlers::me(Extension(state.clone()), authed)
            .await
            .expect_err("Vanished user should be NotFound");

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_me_response_uses_camel_case_user_name() {
        let info = models::UserInfo {
            id: "P_K7NP3X".to_string(),
            user_name: "alice".to_string(),
            email: "a@x.com".to_string(),
            roles: vec!["User".to_string()],
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["userName"], "alice");
        assert!(json.get("user_name").is_none());
    }
}
