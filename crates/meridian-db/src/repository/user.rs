//! # User Repository
//!
//! Operator accounts. Only what register closing needs: look up the
//! stored password hash of the acting user.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use meridian_core::User;

#[derive(Debug, Clone, Copy)]
pub struct UserRepository;

impl UserRepository {
    /// Inserts a user with an already-hashed password.
    pub async fn insert(
        conn: &mut SqliteConnection,
        username: &str,
        password_hash: &str,
    ) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }
}
