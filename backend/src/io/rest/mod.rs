//! # REST API
//!
//! axum handlers grouped by resource. Handlers log the request, convert DTOs
//! with the mappers, call one domain service and turn [`crate::domain::BudgetError`]
//! into a status code with a `{"detail": ...}` body. The extractors in
//! [`extract`] give malformed requests the same body.

pub mod auth;
pub mod auth_apis;
pub mod backup_apis;
pub mod error;
pub mod expense_apis;
pub mod extract;
pub mod health_apis;
pub mod income_apis;
pub mod label_apis;
pub mod mappers;
pub mod month_apis;
pub mod summary_apis;

pub use auth::{require_api_key, AdminUser, AuditUser, CurrentUser};
