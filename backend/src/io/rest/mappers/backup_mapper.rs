use shared::{BackupInfo, BackupListResponse, CreateBackupResponse};

use crate::domain::commands::backups::BackupFile;

pub struct BackupMapper;

impl BackupMapper {
    pub fn to_dto(backup: BackupFile) -> BackupInfo {
        BackupInfo {
            filename: backup.filename,
            size: backup.size,
            created_at: backup.created_at.to_rfc3339(),
        }
    }

    pub fn to_list_dto(backups: Vec<BackupFile>, backup_dir: String) -> BackupListResponse {
        BackupListResponse {
            backups: backups.into_iter().map(Self::to_dto).collect(),
            backup_dir,
        }
    }

    pub fn to_created_dto(backup: BackupFile) -> CreateBackupResponse {
        CreateBackupResponse {
            message: "Backup created successfully".to_string(),
            filename: backup.filename,
            size: backup.size,
            created_at: backup.created_at.to_rfc3339(),
        }
    }
}
