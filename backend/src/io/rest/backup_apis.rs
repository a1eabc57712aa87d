//! # REST API for Database Backups
//!
//! Listing, creating and deleting backups is for administrators. Downloads go
//! through a signed link that expires after five minutes, so a browser can
//! fetch the file without sending credentials.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::{BackupDownloadUrlResponse, MessageResponse};
use tracing::info;

use crate::domain::backup_service::validate_filename;
use crate::domain::token_service::DOWNLOAD_LINK_TTL_SECONDS;
use crate::io::rest::extract::{ApiPath, ApiQuery};
use crate::io::rest::mappers::BackupMapper;
use crate::io::rest::AdminUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub expires: i64,
    pub signature: String,
}

pub async fn list_backups(State(state): State<AppState>, AdminUser(_admin): AdminUser) -> impl IntoResponse {
    info!("GET /api/v1/backups");

    let backup_dir = state.backup_service.backup_dir().display().to_string();
    match state.backup_service.list_backups().await {
        Ok(backups) => (StatusCode::OK, Json(BackupMapper::to_list_dto(backups, backup_dir))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_backup(State(state): State<AppState>, AdminUser(admin): AdminUser) -> impl IntoResponse {
    info!("POST /api/v1/backups/create - admin: {}", admin.email);

    match state.backup_service.create_backup().await {
        Ok(backup) => (StatusCode::CREATED, Json(BackupMapper::to_created_dto(backup))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Sign a download link for an existing backup
pub async fn get_download_url(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiPath(filename): ApiPath<String>,
) -> impl IntoResponse {
    info!("GET /api/v1/backups/{}/download-url", filename);

    if let Err(e) = state.backup_service.backup_path(&filename).await {
        return e.into_response();
    }

    match state.token_service.sign_download(&filename) {
        Ok(link) => (
            StatusCode::OK,
            Json(BackupDownloadUrlResponse {
                download_url: format!(
                    "/api/v1/backups/{}/download?expires={}&signature={}",
                    filename,
                    link.expires_at.timestamp(),
                    link.signature
                ),
                expires_at: link.expires_at.to_rfc3339(),
                valid_for_seconds: DOWNLOAD_LINK_TTL_SECONDS,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Serve a backup file; authorized by the link's signature alone
pub async fn download_backup(
    State(state): State<AppState>,
    ApiPath(filename): ApiPath<String>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> impl IntoResponse {
    info!("GET /api/v1/backups/{}/download", filename);

    if let Err(e) = validate_filename(&filename) {
        return e.into_response();
    }
    if let Err(e) = state
        .token_service
        .verify_download(&filename, query.expires, &query.signature)
    {
        return e.into_response();
    }

    match state.backup_service.read_backup(&filename).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/vnd.sqlite3".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_backup(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(filename): ApiPath<String>,
) -> impl IntoResponse {
    info!("DELETE /api/v1/backups/{} - admin: {}", filename, admin.email);

    match state.backup_service.delete_backup(&filename).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new(format!("Backup {} deleted successfully", filename))),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
