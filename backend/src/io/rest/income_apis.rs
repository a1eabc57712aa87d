//! # REST API for Incomes

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{CreateIncomeRequest, IncomeFilters, MessageResponse, UpdateIncomeRequest};
use tracing::info;

use crate::io::rest::extract::{ApiJson, ApiPath, ApiQuery};
use crate::io::rest::mappers::IncomeMapper;
use crate::io::rest::AuditUser;
use crate::AppState;

pub async fn create_income(
    State(state): State<AppState>,
    user: AuditUser,
    ApiJson(request): ApiJson<CreateIncomeRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/incomes - request: {:?}", request);

    let command = IncomeMapper::to_create_command(request);
    match state.income_service.create_income(command, user.as_deref()).await {
        Ok(income) => (StatusCode::CREATED, Json(IncomeMapper::to_dto(income))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_incomes(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<IncomeFilters>,
) -> impl IntoResponse {
    info!("GET /api/v1/incomes - filters: {:?}", filters);

    match state
        .income_service
        .list_incomes(IncomeMapper::to_query(filters))
        .await
    {
        Ok(incomes) => (StatusCode::OK, Json(IncomeMapper::to_dto_list(incomes))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_income(
    State(state): State<AppState>,
    ApiPath(income_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("GET /api/v1/incomes/{}", income_id);

    match state.income_service.get_income(income_id).await {
        Ok(income) => (StatusCode::OK, Json(IncomeMapper::to_dto(income))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_income(
    State(state): State<AppState>,
    ApiPath(income_id): ApiPath<i64>,
    user: AuditUser,
    ApiJson(request): ApiJson<UpdateIncomeRequest>,
) -> impl IntoResponse {
    info!("PUT /api/v1/incomes/{} - request: {:?}", income_id, request);

    let command = IncomeMapper::to_update_command(request);
    match state
        .income_service
        .update_income(income_id, command, user.as_deref())
        .await
    {
        Ok(income) => (StatusCode::OK, Json(IncomeMapper::to_dto(income))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_income(
    State(state): State<AppState>,
    ApiPath(income_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/v1/incomes/{}", income_id);

    match state.income_service.delete_income(income_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Income deleted successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
