//! Database backups kept as files in one directory.
//!
//! Backups are named `budget_backup_YYYYMMDD_HHMMSS.db`. Requests name a backup
//! by file name only; anything that could leave the backup directory is
//! rejected before the file system is touched.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::backups::BackupFile;
use crate::domain::error::{BudgetError, BudgetResult};
use crate::storage::{BackupStorage, Connection};

const BACKUP_EXTENSION: &str = "db";

#[derive(Clone)]
pub struct BackupService<C: Connection> {
    backup_repository: C::BackupRepository,
    backup_dir: PathBuf,
}

impl<C: Connection> BackupService<C> {
    pub fn new(connection: Arc<C>, backup_dir: PathBuf) -> Self {
        Self {
            backup_repository: connection.create_backup_repository(),
            backup_dir,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Backups in the directory, newest name first. A missing directory has none.
    pub async fn list_backups(&self) -> BudgetResult<Vec<BackupFile>> {
        let mut entries = match tokio::fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_error(e, &self.backup_dir)),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error(e, &self.backup_dir))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            backups.push(self.describe(filename, &path).await?);
        }

        backups.sort_by(|a, b| b.filename.cmp(&a.filename));
        Ok(backups)
    }

    pub async fn create_backup(&self) -> BudgetResult<BackupFile> {
        self.create_backup_at(Utc::now()).await
    }

    pub async fn create_backup_at(&self, now: DateTime<Utc>) -> BudgetResult<BackupFile> {
        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(|e| storage_error(e, &self.backup_dir))?;

        let filename = format!("budget_backup_{}.{}", now.format("%Y%m%d_%H%M%S"), BACKUP_EXTENSION);
        let path = self.backup_dir.join(&filename);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(BudgetError::conflict(format!("Backup {} already exists", filename)));
        }

        self.backup_repository.backup_to(&path).await?;
        let backup = self.describe(&filename, &path).await?;
        info!("Created backup {} ({} bytes)", backup.filename, backup.size);
        Ok(backup)
    }

    /// Path of an existing backup
    pub async fn backup_path(&self, filename: &str) -> BudgetResult<PathBuf> {
        validate_filename(filename)?;
        let path = self.backup_dir.join(filename);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(BudgetError::not_found("Backup file not found"));
        }
        Ok(path)
    }

    pub async fn read_backup(&self, filename: &str) -> BudgetResult<Vec<u8>> {
        let path = self.backup_path(filename).await?;
        tokio::fs::read(&path).await.map_err(|e| storage_error(e, &path))
    }

    pub async fn delete_backup(&self, filename: &str) -> BudgetResult<()> {
        let path = self.backup_path(filename).await?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| storage_error(e, &path))?;
        info!("Deleted backup {}", filename);
        Ok(())
    }

    async fn describe(&self, filename: &str, path: &Path) -> BudgetResult<BackupFile> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| storage_error(e, path))?;
        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(BackupFile {
            filename: filename.to_string(),
            size: metadata.len(),
            created_at,
        })
    }
}

/// Reject names that could reach outside the backup directory
pub fn validate_filename(filename: &str) -> BudgetResult<()> {
    if filename.is_empty() || filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        warn!("Rejected backup file name {:?}", filename);
        return Err(BudgetError::validation("Invalid filename"));
    }
    Ok(())
}

fn storage_error(error: std::io::Error, path: &Path) -> BudgetError {
    BudgetError::Storage(anyhow::Error::new(error).context(format!("Backup I/O failed at {}", path.display())))
}
