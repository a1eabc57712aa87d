//! # Authentication
//!
//! Two layers guard the API:
//!
//! - [`require_api_key`] wraps every `/api/v1` route except health and signed
//!   backup downloads, and identifies the calling client application.
//! - Bearer tokens identify a person. [`CurrentUser`] requires one,
//!   [`AdminUser`] additionally requires the admin flag.
//!
//! [`AuditUser`] names whoever is making a change for the audit columns: the
//! signed-in user when a valid bearer token is present, otherwise the
//! `X-User-Name` header.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

use crate::config::ApiSettings;
use crate::domain::models::user::User;
use crate::domain::token_service::AccessClaims;
use crate::domain::{BudgetError, TokenService};
use crate::io::rest::error::error_response;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const CLIENT_INFO_HEADER: &str = "x-client-info";

/// Reject requests whose `X-API-Key` does not match the configured key
pub async fn require_api_key(
    State(settings): State<Arc<ApiSettings>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .headers()
        .get(CLIENT_INFO_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    debug!("{} {} from client {}", request.method(), request.uri().path(), client);

    let Some(expected) = settings.api_key.as_deref() else {
        error!("API key not configured; refusing {}", request.uri().path());
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "API key not configured on server");
    };

    match request.headers().get(API_KEY_HEADER) {
        None => {
            warn!("Missing API key for {}", request.uri().path());
            error_response(StatusCode::FORBIDDEN, "Missing API key")
        }
        Some(provided) if provided.as_bytes() == expected.as_bytes() => next.run(request).await,
        Some(_) => {
            warn!("Invalid API key for {}", request.uri().path());
            error_response(StatusCode::FORBIDDEN, "Invalid API key")
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn verified_claims(parts: &Parts, tokens: &TokenService) -> Result<AccessClaims, BudgetError> {
    let token = bearer_token(parts).ok_or_else(|| BudgetError::unauthorized("Not authenticated"))?;
    tokens.verify_access_token(token)
}

/// The signed-in, active user behind the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = BudgetError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = verified_claims(parts, &state.token_service)?;

        match state.user_service.get_user(claims.user_id).await {
            Ok(user) if user.is_active => Ok(CurrentUser(user)),
            Ok(_) | Err(BudgetError::NotFound(_)) => {
                warn!("Token for missing or inactive user {}", claims.sub);
                Err(BudgetError::unauthorized("User not found or inactive"))
            }
            Err(e) => Err(e),
        }
    }
}

/// A [`CurrentUser`] with the admin flag
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = BudgetError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            warn!("User {} tried an admin operation on {}", user.email, parts.uri.path());
            return Err(BudgetError::forbidden("Admin access required"));
        }
        Ok(AdminUser(user))
    }
}

/// Name of the person making the request, if known
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditUser(pub Option<String>);

impl AuditUser {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuditUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_some() {
            let tokens = TokenService::from_ref(state);
            match verified_claims(parts, &tokens) {
                Ok(claims) => return Ok(AuditUser(Some(claims.name.unwrap_or(claims.sub)))),
                Err(_) => debug!("Ignoring invalid bearer token for audit name"),
            }
        }

        let user = parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Ok(AuditUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use chrono::Utc;

    async fn extract(request: HttpRequest<()>) -> AuditUser {
        let (mut parts, _) = request.into_parts();
        AuditUser::from_request_parts(&mut parts, &TokenService::new("secret"))
            .await
            .unwrap()
    }

    fn token_for(name: Option<&str>) -> String {
        let now = Utc::now();
        let user = User {
            id: 1,
            email: "amy@example.com".to_string(),
            password_hash: String::new(),
            full_name: name.map(str::to_string),
            is_active: true,
            is_admin: false,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        };
        TokenService::new("secret").issue_access_token(&user).unwrap()
    }

    #[tokio::test]
    async fn test_audit_user_from_header() {
        let request = HttpRequest::builder()
            .header("X-User-Name", "  Alice ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_audit_user_absent_or_blank() {
        let request = HttpRequest::builder().body(()).unwrap();
        assert_eq!(extract(request).await, AuditUser(None));

        let request = HttpRequest::builder().header("X-User-Name", "   ").body(()).unwrap();
        assert_eq!(extract(request).await, AuditUser(None));
    }

    #[tokio::test]
    async fn test_audit_user_prefers_bearer_identity() {
        let request = HttpRequest::builder()
            .header("Authorization", format!("Bearer {}", token_for(Some("Amy"))))
            .header("X-User-Name", "Mallory")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("Amy"));

        let request = HttpRequest::builder()
            .header("Authorization", format!("bearer {}", token_for(None)))
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("amy@example.com"));

        // A bad token falls back to the header
        let request = HttpRequest::builder()
            .header("Authorization", "Bearer forged")
            .header("X-User-Name", "Bob")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let parts = |value: &str| {
            HttpRequest::builder()
                .header("Authorization", value)
                .body(())
                .unwrap()
                .into_parts()
                .0
        };
        assert_eq!(bearer_token(&parts("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&parts("Basic abc")), None);
        assert_eq!(bearer_token(&parts("Bearer ")), None);
        assert_eq!(bearer_token(&parts("abc")), None);
    }
}
