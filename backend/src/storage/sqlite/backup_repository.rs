use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::BackupStorage;

/// Copies the live database to a file with `VACUUM INTO`
#[derive(Clone)]
pub struct BackupRepository {
    db: DbConnection,
}

impl BackupRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BackupStorage for BackupRepository {
    async fn backup_to(&self, path: &Path) -> Result<()> {
        let target = path
            .to_str()
            .ok_or_else(|| anyhow!("Backup path is not valid UTF-8: {}", path.display()))?;

        sqlx::query("VACUUM INTO ?")
            .bind(target)
            .execute(self.db.pool())
            .await
            .with_context(|| format!("Failed to back up database to {}", target))?;

        info!("Database copied to {}", target);
        Ok(())
    }
}
