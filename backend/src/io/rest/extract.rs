//! Request extractors whose rejections use the `{"detail": ...}` error body.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain text. These wrappers
//! run the same extraction and turn the rejection into a
//! [`BudgetError::Validation`], so a malformed body, path or query string gets
//! the same 400 JSON response as any other invalid input.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use tracing::debug;

use crate::domain::BudgetError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(BudgetError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(BudgetError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(BudgetError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for BudgetError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected JSON body: {}", rejection.body_text());
        BudgetError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for BudgetError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path: {}", rejection.body_text());
        BudgetError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for BudgetError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {}", rejection.body_text());
        BudgetError::validation(rejection.body_text())
    }
}

/// Parse an optional JSON body: an empty body yields the default value
pub fn optional_json<T>(body: &[u8]) -> Result<T, BudgetError>
where
    T: Default + serde::de::DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| BudgetError::validation(format!("Failed to parse the request body as JSON: {}", e)))
}
