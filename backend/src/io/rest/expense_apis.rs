//! # REST API for Expenses
//!
//! CRUD plus the month-level operations: reordering, paying an expense and
//! cloning a month's budget into the next month.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{
    CreateExpenseRequest, ExpenseFilters, MessageResponse, PayExpenseRequest,
    ReorderExpensesRequest, UpdateExpenseRequest,
};
use tracing::info;

use crate::domain::commands::expenses::{PayExpenseCommand, ReorderExpensesCommand};
use crate::io::rest::extract::{optional_json, ApiJson, ApiPath, ApiQuery};
use crate::io::rest::mappers::ExpenseMapper;
use crate::io::rest::AuditUser;
use crate::AppState;

pub async fn create_expense(
    State(state): State<AppState>,
    user: AuditUser,
    ApiJson(request): ApiJson<CreateExpenseRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/expenses - request: {:?}", request);

    let command = match ExpenseMapper::to_create_command(request) {
        Ok(command) => command,
        Err(e) => return e.into_response(),
    };

    match state.expense_service.create_expense(command, user.as_deref()).await {
        Ok(expense) => (StatusCode::CREATED, Json(ExpenseMapper::to_dto(expense))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List expenses, optionally filtered by period, category and month
pub async fn list_expenses(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<ExpenseFilters>,
) -> impl IntoResponse {
    info!("GET /api/v1/expenses - filters: {:?}", filters);

    match state
        .expense_service
        .list_expenses(ExpenseMapper::to_query(filters))
        .await
    {
        Ok(expenses) => (StatusCode::OK, Json(ExpenseMapper::to_dto_list(expenses))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_expense(
    State(state): State<AppState>,
    ApiPath(expense_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("GET /api/v1/expenses/{}", expense_id);

    match state.expense_service.get_expense(expense_id).await {
        Ok(expense) => (StatusCode::OK, Json(ExpenseMapper::to_dto(expense))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_expense(
    State(state): State<AppState>,
    ApiPath(expense_id): ApiPath<i64>,
    user: AuditUser,
    ApiJson(request): ApiJson<UpdateExpenseRequest>,
) -> impl IntoResponse {
    info!("PUT /api/v1/expenses/{} - request: {:?}", expense_id, request);

    let command = match ExpenseMapper::to_update_command(request) {
        Ok(command) => command,
        Err(e) => return e.into_response(),
    };

    match state
        .expense_service
        .update_expense(expense_id, command, user.as_deref())
        .await
    {
        Ok(expense) => (StatusCode::OK, Json(ExpenseMapper::to_dto(expense))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_expense(
    State(state): State<AppState>,
    ApiPath(expense_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/v1/expenses/{}", expense_id);

    match state.expense_service.delete_expense(expense_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Expense deleted successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Persist a new display order; each id gets its position as `order`
pub async fn reorder_expenses(
    State(state): State<AppState>,
    user: AuditUser,
    ApiJson(request): ApiJson<ReorderExpensesRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/expenses/reorder - request: {:?}", request);

    let command = ReorderExpensesCommand {
        expense_ids: request.expense_ids,
    };
    match state
        .expense_service
        .reorder_expenses(command, user.as_deref())
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(ExpenseMapper::to_dto_list(result.expenses)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Record a payment. An empty body pays the budget; a body that is not a
/// valid `PayExpenseRequest` is rejected.
pub async fn pay_expense(
    State(state): State<AppState>,
    ApiPath(expense_id): ApiPath<i64>,
    user: AuditUser,
    body: Bytes,
) -> impl IntoResponse {
    let request: PayExpenseRequest = match optional_json(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };
    info!("POST /api/v1/expenses/{}/pay - request: {:?}", expense_id, request);

    let command = PayExpenseCommand {
        amount: request.amount,
    };
    match state
        .expense_service
        .pay_expense(expense_id, command, user.as_deref())
        .await
    {
        Ok(expense) => (StatusCode::OK, Json(ExpenseMapper::to_dto(expense))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn clone_to_next_month(
    State(state): State<AppState>,
    ApiPath(month_id): ApiPath<i64>,
    user: AuditUser,
) -> impl IntoResponse {
    info!("POST /api/v1/expenses/clone-to-next-month/{}", month_id);

    match state
        .expense_service
        .clone_to_next_month(month_id, user.as_deref())
        .await
    {
        Ok(result) => (StatusCode::OK, Json(ExpenseMapper::to_clone_dto(result))).into_response(),
        Err(e) => e.into_response(),
    }
}
