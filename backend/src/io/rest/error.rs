//! Translation of domain errors into HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;
use tracing::{error, warn};

use crate::domain::BudgetError;

impl BudgetError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BudgetError::NotFound(_) => StatusCode::NOT_FOUND,
            BudgetError::Validation(_) | BudgetError::InUse { .. } => StatusCode::BAD_REQUEST,
            BudgetError::Conflict(_) => StatusCode::CONFLICT,
            BudgetError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BudgetError::Forbidden(_) => StatusCode::FORBIDDEN,
            BudgetError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BudgetError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            BudgetError::Storage(e) => {
                error!("Storage failure: {:#}", e);
                "Internal server error".to_string()
            }
            other => {
                warn!("Request rejected ({}): {}", status, other);
                other.to_string()
            }
        };

        let mut response = (status, Json(ErrorResponse { detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Plain `{"detail": ...}` response for failures outside the domain
pub fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { detail: detail.into() })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_codes() {
        assert_eq!(BudgetError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BudgetError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BudgetError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(BudgetError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(BudgetError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        let in_use = BudgetError::InUse {
            message: "Cannot delete category: it is used by 2 expense(s)".to_string(),
            count: 2,
        };
        assert_eq!(in_use.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_storage_error_hides_details() {
        let response = BudgetError::Storage(anyhow::anyhow!("disk I/O error")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.detail, "Internal server error");
    }

    #[tokio::test]
    async fn test_unauthorized_asks_for_bearer() {
        let response = BudgetError::unauthorized("Not authenticated").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(body_of(response).await.detail, "Not authenticated");
    }

    #[tokio::test]
    async fn test_validation_detail_passes_through() {
        let response = BudgetError::validation("Month must be between 1 and 12").into_response();
        assert_eq!(body_of(response).await.detail, "Month must be between 1 and 12");
    }
}
