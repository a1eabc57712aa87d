//! # REST API for Months
//!
//! Creating, browsing, editing and closing budgeting months.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{CreateMonthRequest, MessageResponse, UpdateMonthRequest};
use tracing::info;

use crate::io::rest::extract::{ApiJson, ApiPath};
use crate::io::rest::mappers::MonthMapper;
use crate::io::rest::AuditUser;
use crate::AppState;

/// Create a month
pub async fn create_month(
    State(state): State<AppState>,
    user: AuditUser,
    ApiJson(request): ApiJson<CreateMonthRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/months - request: {:?}", request);

    let command = MonthMapper::to_create_command(request);
    match state.month_service.create_month(command, user.as_deref()).await {
        Ok(month) => (StatusCode::CREATED, Json(MonthMapper::to_dto(month))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List months, newest first
pub async fn list_months(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/v1/months");

    match state.month_service.list_months().await {
        Ok(months) => (StatusCode::OK, Json(MonthMapper::to_dto_list(months))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// The month containing today, or the latest month
pub async fn get_current_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/v1/months/current");

    match state.month_service.current_month().await {
        Ok(month) => (StatusCode::OK, Json(MonthMapper::to_dto(month))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_month(
    State(state): State<AppState>,
    ApiPath(month_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("GET /api/v1/months/{}", month_id);

    match state.month_service.get_month(month_id).await {
        Ok(month) => (StatusCode::OK, Json(MonthMapper::to_dto(month))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_month_by_year_month(
    State(state): State<AppState>,
    ApiPath((year, month)): ApiPath<(i32, u32)>,
) -> impl IntoResponse {
    info!("GET /api/v1/months/year/{}/month/{}", year, month);

    match state.month_service.get_month_by_year_month(year, month).await {
        Ok(month) => (StatusCode::OK, Json(MonthMapper::to_dto(month))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_month(
    State(state): State<AppState>,
    ApiPath(month_id): ApiPath<i64>,
    user: AuditUser,
    ApiJson(request): ApiJson<UpdateMonthRequest>,
) -> impl IntoResponse {
    info!("PUT /api/v1/months/{} - request: {:?}", month_id, request);

    let command = MonthMapper::to_update_command(request);
    match state
        .month_service
        .update_month(month_id, command, user.as_deref())
        .await
    {
        Ok(month) => (StatusCode::OK, Json(MonthMapper::to_dto(month))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a month together with its expenses and incomes
pub async fn delete_month(
    State(state): State<AppState>,
    ApiPath(month_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/v1/months/{}", month_id);

    match state.month_service.delete_month(month_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Month deleted successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn close_month(
    State(state): State<AppState>,
    ApiPath(month_id): ApiPath<i64>,
    user: AuditUser,
) -> impl IntoResponse {
    info!("POST /api/v1/months/{}/close", month_id);

    match state.month_service.close_month(month_id, user.as_deref()).await {
        Ok(result) => (StatusCode::OK, Json(MonthMapper::to_status_dto(result))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn open_month(
    State(state): State<AppState>,
    ApiPath(month_id): ApiPath<i64>,
    user: AuditUser,
) -> impl IntoResponse {
    info!("POST /api/v1/months/{}/open", month_id);

    match state.month_service.open_month(month_id, user.as_deref()).await {
        Ok(result) => (StatusCode::OK, Json(MonthMapper::to_status_dto(result))).into_response(),
        Err(e) => e.into_response(),
    }
}
