use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::user::{NewUser, PasswordReset, User};
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::UserStorage;

const USER_COLUMNS: &str = "id, email, password_hash, full_name, is_active, is_admin, \
    created_at, updated_at, created_by, updated_by";

const RESET_COLUMNS: &str = "id, user_id, token, short_code, expires_at, used, created_at";

/// Repository for accounts and their password reset tokens
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            full_name: row.try_get("full_name")?,
            is_active: row.try_get("is_active")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
        })
    }

    fn row_to_reset(row: &SqliteRow) -> Result<PasswordReset> {
        Ok(PasswordReset {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token: row.try_get("token")?,
            short_code: row.try_get("short_code")?,
            expires_at: row.try_get("expires_at")?,
            used: row.try_get("used")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn insert_user(&self, user: &NewUser, created_by: Option<&str>) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, full_name, is_active, is_admin,
                               created_at, updated_at, created_by, updated_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(now)
        .bind(now)
        .bind(created_by)
        .bind(created_by)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.get_user(id)
            .await?
            .ok_or_else(|| anyhow!("User {} vanished after insert", id))
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY email"))
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    async fn update_user(&self, user: &User, updated_by: Option<&str>) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, password_hash = ?, full_name = ?, is_active = ?, is_admin = ?,
                updated_at = ?, updated_by = COALESCE(?, updated_by)
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(Utc::now())
        .bind(updated_by)
        .bind(user.id)
        .execute(self.db.pool())
        .await?;

        self.get_user(user.id)
            .await?
            .ok_or_else(|| anyhow!("User {} not found after update", user.id))
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_reset(
        &self,
        user_id: i64,
        token: &str,
        short_code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset> {
        let result = sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (user_id, token, short_code, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(short_code)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        let row = sqlx::query(&format!(
            "SELECT {RESET_COLUMNS} FROM password_reset_tokens WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(self.db.pool())
        .await?;
        Self::row_to_reset(&row)
    }

    async fn find_reset(&self, token_or_code: &str) -> Result<Option<PasswordReset>> {
        // Short codes can repeat across users; the newest one wins
        let row = sqlx::query(&format!(
            "SELECT {RESET_COLUMNS} FROM password_reset_tokens \
             WHERE token = ? OR short_code = ? ORDER BY id DESC LIMIT 1"
        ))
        .bind(token_or_code)
        .bind(token_or_code)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_reset).transpose()
    }

    async fn mark_reset_used(&self, reset_id: i64) -> Result<()> {
        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE id = ?")
            .bind(reset_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn list_active_resets(&self, now: DateTime<Utc>) -> Result<Vec<(PasswordReset, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.user_id, t.token, t.short_code, t.expires_at, t.used, t.created_at,
                   u.email
            FROM password_reset_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.used = FALSE AND t.expires_at > ?
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(now)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| Ok((Self::row_to_reset(row)?, row.try_get("email")?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn setup_test() -> UserRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        UserRepository::new(db)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: None,
            is_active: true,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_insert_get_and_list_users() {
        let repo = setup_test().await;

        let zed = repo.insert_user(&new_user("zed@example.com"), Some("admin")).await.unwrap();
        repo.insert_user(&new_user("amy@example.com"), None).await.unwrap();
        assert_eq!(zed.created_by.as_deref(), Some("admin"));
        assert!(zed.is_active);

        let fetched = repo.get_user_by_email("zed@example.com").await.unwrap().unwrap();
        assert_eq!(fetched, zed);
        assert!(repo.get_user_by_email("ZED@example.com").await.unwrap().is_none());

        let emails: Vec<String> = repo.list_users().await.unwrap().into_iter().map(|u| u.email).collect();
        assert_eq!(emails, vec!["amy@example.com", "zed@example.com"]);

        assert!(repo.insert_user(&new_user("amy@example.com"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_update_user() {
        let repo = setup_test().await;
        let mut user = repo.insert_user(&new_user("amy@example.com"), None).await.unwrap();

        user.full_name = Some("Amy".to_string());
        user.is_admin = true;
        user.password_hash = "other".to_string();
        let updated = repo.update_user(&user, Some("root")).await.unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Amy"));
        assert!(updated.is_admin);
        assert_eq!(updated.password_hash, "other");
        assert_eq!(updated.updated_by.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn test_reset_tokens() {
        let repo = setup_test().await;
        let user = repo.insert_user(&new_user("amy@example.com"), None).await.unwrap();
        let now = Utc::now();

        let reset = repo
            .insert_reset(user.id, "long-token", "123456", now + Duration::hours(1))
            .await
            .unwrap();
        repo.insert_reset(user.id, "old-token", "654321", now - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(repo.find_reset("long-token").await.unwrap().map(|r| r.id), Some(reset.id));
        assert_eq!(repo.find_reset("123456").await.unwrap().map(|r| r.id), Some(reset.id));
        assert!(repo.find_reset("nope").await.unwrap().is_none());

        let active = repo.list_active_resets(now).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].1, "amy@example.com");

        repo.mark_reset_used(reset.id).await.unwrap();
        assert!(repo.find_reset("long-token").await.unwrap().unwrap().used);
        assert!(repo.list_active_resets(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_removes_resets() {
        let repo = setup_test().await;
        let user = repo.insert_user(&new_user("amy@example.com"), None).await.unwrap();
        repo.insert_reset(user.id, "t", "111111", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert!(repo.delete_user(user.id).await.unwrap());
        assert!(!repo.delete_user(user.id).await.unwrap());
        assert!(repo.find_reset("t").await.unwrap().is_none());
    }
}
