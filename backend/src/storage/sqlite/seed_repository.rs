use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::SeedStorage;

/// Tracks which seed sets have already been applied
#[derive(Clone)]
pub struct SeedRepository {
    db: DbConnection,
}

impl SeedRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SeedStorage for SeedRepository {
    async fn seed_executed(&self, seed_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seed_records WHERE seed_id = ?")
            .bind(seed_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count > 0)
    }

    async fn record_seed(&self, seed_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO seed_records (seed_id, executed_at) VALUES (?, ?)")
            .bind(seed_id)
            .bind(Utc::now())
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_seed_is_idempotent() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = SeedRepository::new(db);

        assert!(!repo.seed_executed("default_categories").await.unwrap());
        repo.record_seed("default_categories").await.unwrap();
        repo.record_seed("default_categories").await.unwrap();
        assert!(repo.seed_executed("default_categories").await.unwrap());
        assert!(!repo.seed_executed("default_periods").await.unwrap());
    }
}
