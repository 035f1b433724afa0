//! User repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;
use crate::models::Username;

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user.
    ///
    /// A taken username surfaces as [`DbError::Conflict`] from the unique
    /// constraint.
    pub async fn create(&self, username: &Username, password_hash: &str) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at, updated_at
            "#,
        )
        .bind(username.as_str())
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::Conflict {
                resource: "Username",
                value: username.as_str().to_owned(),
            },
            other => DbError::Sqlx(other),
        })
    }

    /// Look up a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a single user by ID.
    pub async fn get(&self, id: Uuid) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            SELECT id, username, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "User",
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::migrations::run(&pool).await.unwrap();
        pool
    }

    fn unique_name() -> Username {
        let suffix = &Uuid::new_v4().simple().to_string()[..12];
        Username::new(&format!("u_{suffix}")).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_and_find() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let name = unique_name();

        let user = repo.create(&name, "$argon2id$fake").await.unwrap();
        assert_eq!(user.username, name.as_str());

        let found = repo.find_by_username(name.as_str()).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(repo.get(user.id).await.unwrap().username, name.as_str());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_username_conflicts() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let name = unique_name();

        repo.create(&name, "h1").await.unwrap();
        let err = repo.create(&name, "h2").await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { resource: "Username", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_user_not_found() {
        let pool = pool().await;
        let err = UserRepo::new(&pool).get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "User", .. }));
    }
}
