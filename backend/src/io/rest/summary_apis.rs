//! # REST API for Summaries
//!
//! Read-only rollups of expenses and incomes. Every endpoint is scoped by
//! optional query parameters.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use crate::io::rest::extract::ApiQuery;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TotalsQuery {
    pub period: Option<String>,
    pub month_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    pub num_months: Option<u32>,
}

pub async fn get_totals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TotalsQuery>,
) -> impl IntoResponse {
    info!("GET /api/v1/summary/totals - query: {:?}", query);

    match state.summary_service.totals(query.period, query.month_id).await {
        Ok(totals) => (StatusCode::OK, Json(totals)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_by_period(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/v1/summary/by-period - query: {:?}", query);

    match state.summary_service.by_period(query.month_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_monthly_trends(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TrendsQuery>,
) -> impl IntoResponse {
    info!("GET /api/v1/summary/monthly-trends - query: {:?}", query);

    match state.summary_service.monthly_trends(query.num_months).await {
        Ok(trends) => (StatusCode::OK, Json(trends)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Budget against spend per category
pub async fn get_category_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/v1/categories/summary - query: {:?}", query);

    match state.summary_service.category_summary(query.month_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_income_type_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TotalsQuery>,
) -> impl IntoResponse {
    info!("GET /api/v1/income-types/summary - query: {:?}", query);

    match state
        .summary_service
        .income_type_summary(query.period, query.month_id)
        .await
    {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}
