//! Credential store
//!
//! Owns user records, password hashing and role memberships on top of the
//! sqlite pool. Handlers never run identity SQL or touch bcrypt directly;
//! everything goes through [`UserStore`].

use sqlx::SqlitePool;
use tracing::{debug, error};
use uuid::Uuid;

use crate::common::generate_player_id;
use crate::game::Player;

/// Well-known role names
pub const ROLE_USER: &str = "User";
pub const ROLE_ADMIN: &str = "Admin";

/// Why a user could not be created
#[derive(Debug)]
pub enum CreateUserError {
    /// The username is already taken (pre-check or UNIQUE violation)
    UsernameTaken,
    /// Password hashing failed
    Hash(bcrypt::BcryptError),
    Database(sqlx::Error),
}

/// Credential store over the sqlite pool
#[derive(Clone)]
pub struct UserStore {
    db: SqlitePool,
}

impl UserStore {
    pub fn new(db: SqlitePool) -> Self {
        UserStore { db }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// Create a user record with a bcrypt-hashed password and a fresh
    /// security stamp. The users.username UNIQUE constraint backs the
    /// caller's exists-check; a violation here means a concurrent register
    /// won the race and is reported as [`CreateUserError::UsernameTaken`].
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Player, CreateUserError> {
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
            error!(error = %e, "Password hashing failed");
            CreateUserError::Hash(e)
        })?;

        let id = generate_player_id();
        let security_stamp = Uuid::new_v4().to_string();

        let insert = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, security_stamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .bind(&security_stamp)
        .execute(&self.db)
        .await;

        if let Err(e) = insert {
            if is_unique_violation(&e) {
                debug!(username = %username, "Insert lost the uniqueness race");
                return Err(CreateUserError::UsernameTaken);
            }
            return Err(CreateUserError::Database(e));
        }

        // fetch back so created_at reflects what the database stored
        sqlx::query_as::<_, Player>("SELECT * FROM users WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.db)
            .await
            .map_err(CreateUserError::Database)
    }

    /// Verify a plaintext password against the stored hash. Hash corruption
    /// counts as a failed verification, never as a distinct error surface.
    pub fn verify_password(&self, user: &Player, password: &str) -> bool {
        bcrypt::verify(password, &user.password_hash).unwrap_or(false)
    }

    pub async fn role_exists(&self, name: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    /// Idempotent: creating an existing role is a no-op
    pub async fn create_role(&self, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO roles (name) VALUES (?)")
            .bind(name)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn assign_role(&self, user_id: &str, role: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_name) VALUES (?, ?)")
            .bind(user_id)
            .bind(role)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn list_roles(&self, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT role_name FROM user_roles WHERE user_id = ? ORDER BY role_name",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Ensure a role exists, then add the user to it
    pub async fn ensure_role_and_assign(
        &self,
        user_id: &str,
        role: &str,
    ) -> Result<(), sqlx::Error> {
        if !self.role_exists(role).await? {
            self.create_role(role).await?;
        }
        self.assign_role(user_id, role).await
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}
