//! # REST API for Labels
//!
//! Categories, periods and income types share the same four endpoints. One
//! router is built per [`LabelKind`] and nested under its own prefix.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use shared::{LabelRequest, MessageResponse};
use tracing::info;

use crate::domain::models::label::LabelKind;
use crate::io::rest::extract::{ApiJson, ApiPath};
use crate::io::rest::mappers::LabelMapper;
use crate::io::rest::AuditUser;
use crate::AppState;

/// `GET /`, `POST /`, `PUT /:id` and `DELETE /:id` for one kind of label
pub fn label_routes(kind: LabelKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(move |state: State<AppState>| list_labels(state, kind)).post(
                move |state: State<AppState>, user: AuditUser, request: ApiJson<LabelRequest>| {
                    create_label(state, kind, user, request)
                },
            ),
        )
        .route(
            "/:id",
            put(
                move |state: State<AppState>,
                      path: ApiPath<i64>,
                      user: AuditUser,
                      request: ApiJson<LabelRequest>| {
                    update_label(state, kind, path, user, request)
                },
            )
            .delete(move |state: State<AppState>, path: ApiPath<i64>| delete_label(state, kind, path)),
        )
}

fn prefix(kind: LabelKind) -> &'static str {
    match kind {
        LabelKind::Category => "/api/v1/categories",
        LabelKind::Period => "/api/v1/periods",
        LabelKind::IncomeType => "/api/v1/income-types",
    }
}

pub async fn list_labels(State(state): State<AppState>, kind: LabelKind) -> Response {
    info!("GET {}", prefix(kind));

    match state.labels(kind).list_labels().await {
        Ok(labels) => (StatusCode::OK, Json(LabelMapper::to_dto_list(labels))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_label(
    State(state): State<AppState>,
    kind: LabelKind,
    user: AuditUser,
    ApiJson(request): ApiJson<LabelRequest>,
) -> Response {
    info!("POST {} - request: {:?}", prefix(kind), request);

    let command = LabelMapper::to_command(request);
    match state.labels(kind).create_label(command, user.as_deref()).await {
        Ok(label) => (StatusCode::CREATED, Json(LabelMapper::to_dto(label))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_label(
    State(state): State<AppState>,
    kind: LabelKind,
    ApiPath(label_id): ApiPath<i64>,
    user: AuditUser,
    ApiJson(request): ApiJson<LabelRequest>,
) -> Response {
    info!("PUT {}/{} - request: {:?}", prefix(kind), label_id, request);

    let command = LabelMapper::to_command(request);
    match state
        .labels(kind)
        .update_label(label_id, command, user.as_deref())
        .await
    {
        Ok(label) => (StatusCode::OK, Json(LabelMapper::to_dto(label))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Refused with 400 while expenses or incomes still reference the label
pub async fn delete_label(
    State(state): State<AppState>,
    kind: LabelKind,
    ApiPath(label_id): ApiPath<i64>,
) -> Response {
    info!("DELETE {}/{}", prefix(kind), label_id);

    let service = state.labels(kind);
    match service.delete_label(label_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new(service.deleted_message())),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
