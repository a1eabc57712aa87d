//! Public REST contract for the budget API.
//!
//! Every type in this crate is serialized as JSON on the wire. The backend maps
//! its domain models into these DTOs; clients (web, mobile, terminal) consume them
//! directly.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Used with `#[serde(default, deserialize_with = "double_option")]` so that an
/// absent key yields `None` and `null` yields `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Months
// ---------------------------------------------------------------------------

/// A budgeting month (e.g. "November 2024")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Month {
    pub id: i64,
    pub year: i32,
    /// 1-12
    pub month: u32,
    pub name: String,
    /// ISO date (YYYY-MM-DD) of the first day
    pub start_date: String,
    /// ISO date (YYYY-MM-DD) of the last day
    pub end_date: String,
    pub is_closed: bool,
    pub closed_at: Option<String>,
    pub closed_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMonthRequest {
    pub year: i32,
    pub month: u32,
}

/// Partial month update. Changing `year` or `month` regenerates name and dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMonthRequest {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Response after closing or reopening a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCloseResponse {
    pub id: i64,
    pub name: String,
    pub is_closed: bool,
    pub closed_at: Option<String>,
    pub closed_by: Option<String>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

/// An itemized payment accumulating toward an expense's cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub name: String,
    pub amount: f64,
    /// ISO date the purchase was made
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub expense_name: String,
    pub period: String,
    pub category: String,
    pub budget: f64,
    pub cost: f64,
    pub notes: Option<String>,
    pub month_id: i64,
    pub purchases: Option<Vec<Purchase>>,
    pub order: i64,
    pub expense_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateExpenseRequest {
    pub expense_name: String,
    pub period: String,
    pub category: String,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub month_id: i64,
    #[serde(default)]
    pub purchases: Option<Vec<Purchase>>,
    /// Position within the month; appended after the last expense when absent
    #[serde(default)]
    pub order: Option<i64>,
    /// Defaults to today when absent
    #[serde(default)]
    pub expense_date: Option<String>,
}

/// Partial expense update.
///
/// `purchases` and `notes` distinguish an absent key (unchanged) from an explicit
/// `null` (cleared).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateExpenseRequest {
    #[serde(default)]
    pub expense_name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub month_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub purchases: Option<Option<Vec<Purchase>>>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub expense_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFilters {
    pub period: Option<String>,
    pub category: Option<String>,
    pub month_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderExpensesRequest {
    /// Expense ids in the desired order
    pub expense_ids: Vec<i64>,
}

/// Pay an expense; the expense budget is used when `amount` is absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayExpenseRequest {
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneMonthResponse {
    pub message: String,
    pub cloned_count: u64,
    pub cloned_income_count: u64,
    pub next_month_id: i64,
    pub next_month_name: String,
}

// ---------------------------------------------------------------------------
// Incomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub income_type_id: i64,
    pub period: String,
    pub budget: f64,
    pub amount: f64,
    pub month_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIncomeRequest {
    pub income_type_id: i64,
    pub period: String,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub amount: f64,
    pub month_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateIncomeRequest {
    pub income_type_id: Option<i64>,
    pub period: Option<String>,
    pub budget: Option<f64>,
    pub amount: Option<f64>,
    pub month_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeFilters {
    pub period: Option<String>,
    pub income_type_id: Option<i64>,
    pub month_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Labels: categories, periods and income types share one shape
// ---------------------------------------------------------------------------

/// A named, colored label (category, period or income type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub name: String,
    /// Hex color, e.g. "#8b5cf6"
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

pub type Category = Label;
pub type Period = Label;
pub type IncomeType = Label;

/// Body for creating or renaming a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

// ---------------------------------------------------------------------------
// Summaries and reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub total_budgeted_expenses: f64,
    pub total_current_expenses: f64,
    pub total_budgeted_income: f64,
    pub total_current_income: f64,
    /// Budgeted income minus budgeted expenses
    pub total_budgeted: f64,
    /// Current income minus current expenses
    pub total_current: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub budget: f64,
    pub total: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTypeSummary {
    pub income_type: String,
    pub budget: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: String,
    pub color: String,
    pub total_income: f64,
    pub total_expenses: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummaryResponse {
    pub periods: Vec<PeriodSummary>,
    pub grand_total_income: f64,
    pub grand_total_expenses: f64,
    pub grand_total_difference: f64,
}

/// Category spending for a single month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTrendItem {
    pub category: String,
    pub amount: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendData {
    pub month_id: i64,
    pub month_name: String,
    pub year: i32,
    pub month: u32,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_savings: f64,
    /// Percentage (0-100), one decimal
    pub savings_rate: f64,
    pub categories: Vec<CategoryTrendItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendsResponse {
    pub months: Vec<MonthlyTrendData>,
    pub average_income: f64,
    pub average_expenses: f64,
    pub average_savings_rate: f64,
}

// ---------------------------------------------------------------------------
// Users and authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token issued on login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// No email is sent; the token is returned when the account exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub email_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// `token` may be the long reset token or the six-digit short code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

/// Account created by an administrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
}

fn default_true() -> bool {
    true
}

/// Partial user update; `full_name: null` clears the name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub full_name: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

/// An outstanding password reset, as listed for administrators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordResetItem {
    pub user_email: String,
    pub short_code: String,
    pub created_at: String,
    pub expires_at: String,
    pub minutes_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResetLinkResponse {
    pub user_email: String,
    pub reset_url: String,
    pub short_code: String,
    pub expires_in_minutes: i64,
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupListResponse {
    pub backups: Vec<BackupInfo>,
    pub backup_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBackupResponse {
    pub message: String,
    pub filename: String,
    pub size: u64,
    pub created_at: String,
}

/// Short-lived download link that works without credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDownloadUrlResponse {
    pub download_url: String,
    pub expires_at: String,
    pub valid_for_seconds: i64,
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

/// Plain acknowledgement, e.g. after a delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body returned with every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_expense_request_distinguishes_null_from_absent() {
        let absent: UpdateExpenseRequest = serde_json::from_str(r#"{"budget": 10.0}"#).unwrap();
        assert_eq!(absent.purchases, None);
        assert_eq!(absent.notes, None);
        assert_eq!(absent.budget, Some(10.0));

        let cleared: UpdateExpenseRequest =
            serde_json::from_str(r#"{"purchases": null, "notes": null}"#).unwrap();
        assert_eq!(cleared.purchases, Some(None));
        assert_eq!(cleared.notes, Some(None));

        let set: UpdateExpenseRequest =
            serde_json::from_str(r#"{"purchases": [{"name": "Milk", "amount": 2.5}]}"#).unwrap();
        let purchases = set.purchases.unwrap().unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].date, None);
    }

    #[test]
    fn test_create_expense_request_defaults() {
        let request: CreateExpenseRequest = serde_json::from_str(
            r#"{"expense_name": "Rent", "period": "1st Period", "category": "Rent/Utilities", "month_id": 3}"#,
        )
        .unwrap();
        assert_eq!(request.budget, 0.0);
        assert_eq!(request.cost, 0.0);
        assert!(request.purchases.is_none());
        assert!(request.order.is_none());
        assert!(request.expense_date.is_none());
    }

    #[test]
    fn test_user_requests_defaults() {
        let request: CreateUserRequest =
            serde_json::from_str(r#"{"email": "a@b.c", "password": "secret"}"#).unwrap();
        assert!(request.is_active);
        assert!(!request.is_admin);
        assert!(request.full_name.is_none());

        let update: UpdateUserRequest = serde_json::from_str(r#"{"full_name": null}"#).unwrap();
        assert_eq!(update.full_name, Some(None));
        assert!(update.email.is_none());
    }

    #[test]
    fn test_forgot_password_response_omits_missing_token() {
        let response = ForgotPasswordResponse {
            message: "If the email exists, a password reset link has been sent".to_string(),
            email_sent: false,
            token: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("token").is_none());
    }

    #[test]
    fn test_label_request_color_optional() {
        let request: LabelRequest = serde_json::from_str(r#"{"name": "Groceries"}"#).unwrap();
        assert_eq!(request.name, "Groceries");
        assert!(request.color.is_none());
    }
}
