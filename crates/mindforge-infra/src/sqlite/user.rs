//! Users and their API keys.
//!
//! Only key hashes are stored; hashing and key generation belong to the API
//! layer that hands keys out.

use chrono::Utc;
use mindforge_types::chat::User;
use mindforge_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

pub struct SqliteUserRepository {
    pool: DatabasePool,
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let created_at: String = row.try_get("created_at").map_err(query_error)?;
    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?,
        name: row.try_get("name").map_err(query_error)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, name: &str) -> Result<User, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::Validation("user name cannot be empty".to_string()));
        }
        let user = User {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO users (id, name, created_at) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(format_datetime(&user.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Store the hash of a freshly issued key for `user_id`.
    ///
    /// `key_prefix` is a short non-secret head of the key kept for display.
    pub async fn add_api_key(
        &self,
        user_id: &Uuid,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO api_keys (id, user_id, key_hash, key_prefix, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(user_id.to_string())
        .bind(key_hash)
        .bind(key_prefix)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict("api key already registered".to_string())
            }
            other => query_error(other),
        })?;
        Ok(())
    }

    /// Resolve a key hash to its owner and record the use.
    ///
    /// The `last_used_at` update is best effort and never fails the lookup.
    pub async fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.name, u.created_at
               FROM api_keys k JOIN users u ON u.id = k.user_id
               WHERE k.key_hash = ?"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = user_from_row(&row)?;

        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE key_hash = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(key_hash)
            .execute(&self.pool.writer)
            .await
        {
            tracing::debug!(error = %e, "failed to record api key use");
        }
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::database_url;

    async fn repo() -> SqliteUserRepository {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        std::mem::forget(dir);
        SqliteUserRepository::new(DatabasePool::new(&url).await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = repo().await;
        let user = repo.create_user("  alice ").await.unwrap();
        assert_eq!(user.name, "alice");

        let found = repo.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.get_user(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let repo = repo().await;
        assert!(matches!(
            repo.create_user(" ").await,
            Err(RepositoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_api_key_lookup() {
        let repo = repo().await;
        let alice = repo.create_user("alice").await.unwrap();
        let bob = repo.create_user("bob").await.unwrap();
        repo.add_api_key(&alice.id, "hash-a", "mf_aaaa").await.unwrap();
        repo.add_api_key(&bob.id, "hash-b", "mf_bbbb").await.unwrap();

        assert_eq!(repo.find_by_key_hash("hash-a").await.unwrap().unwrap().id, alice.id);
        assert_eq!(repo.find_by_key_hash("hash-b").await.unwrap().unwrap().id, bob.id);
        assert!(repo.find_by_key_hash("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_key_and_unknown_user() {
        let repo = repo().await;
        let alice = repo.create_user("alice").await.unwrap();
        repo.add_api_key(&alice.id, "hash-a", "mf_aaaa").await.unwrap();

        assert!(matches!(
            repo.add_api_key(&alice.id, "hash-a", "mf_aaaa").await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            repo.add_api_key(&Uuid::now_v7(), "hash-x", "mf_xxxx").await,
            Err(RepositoryError::NotFound)
        ));
    }
}
