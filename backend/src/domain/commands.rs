//! Domain-level command and result types.
//!
//! Services take these instead of the public DTOs from the `shared` crate; the
//! REST layer maps between the two.

pub mod months {
    use crate::domain::models::month::Month;

    #[derive(Debug, Clone)]
    pub struct CreateMonthCommand {
        pub year: i32,
        pub month: u32,
    }

    /// Partial update; `None` leaves a field unchanged
    #[derive(Debug, Clone, Default)]
    pub struct UpdateMonthCommand {
        pub year: Option<i32>,
        pub month: Option<u32>,
        pub name: Option<String>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    /// Result of closing or reopening a month
    #[derive(Debug, Clone)]
    pub struct MonthStatusResult {
        pub month: Month,
        pub message: String,
    }
}

pub mod expenses {
    use crate::domain::models::{expense::Expense, expense::Purchase, month::Month};

    #[derive(Debug, Clone)]
    pub struct CreateExpenseCommand {
        pub expense_name: String,
        pub period: String,
        pub category: String,
        pub budget: f64,
        pub cost: f64,
        pub notes: Option<String>,
        pub month_id: i64,
        pub purchases: Option<Vec<Purchase>>,
        pub order: Option<i64>,
        pub expense_date: Option<String>,
    }

    /// Partial update.
    ///
    /// For `notes` and `purchases` the outer `Option` says whether the field was
    /// sent at all; the inner one carries an explicit null.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateExpenseCommand {
        pub expense_name: Option<String>,
        pub period: Option<String>,
        pub category: Option<String>,
        pub budget: Option<f64>,
        pub cost: Option<f64>,
        pub notes: Option<Option<String>>,
        pub month_id: Option<i64>,
        pub purchases: Option<Option<Vec<Purchase>>>,
        pub order: Option<i64>,
        pub expense_date: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct PayExpenseCommand {
        pub amount: Option<f64>,
    }

    #[derive(Debug, Clone)]
    pub struct ReorderExpensesCommand {
        pub expense_ids: Vec<i64>,
    }

    #[derive(Debug, Clone)]
    pub struct ReorderExpensesResult {
        pub expenses: Vec<Expense>,
    }

    /// Outcome of copying a month's budget lines into the following month
    #[derive(Debug, Clone)]
    pub struct CloneMonthResult {
        pub message: String,
        pub cloned_count: u64,
        pub cloned_income_count: u64,
        pub next_month: Month,
    }
}

pub mod incomes {
    #[derive(Debug, Clone)]
    pub struct CreateIncomeCommand {
        pub income_type_id: i64,
        pub period: String,
        pub budget: f64,
        pub amount: f64,
        pub month_id: i64,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateIncomeCommand {
        pub income_type_id: Option<i64>,
        pub period: Option<String>,
        pub budget: Option<f64>,
        pub amount: Option<f64>,
        pub month_id: Option<i64>,
    }
}

pub mod labels {
    /// Create or rename a category, period or income type
    #[derive(Debug, Clone)]
    pub struct LabelCommand {
        pub name: String,
        pub color: Option<String>,
    }
}

pub mod users {
    use chrono::{DateTime, Utc};

    use crate::domain::models::user::User;

    /// New account. Passwords are never logged, so there is no `Debug`.
    #[derive(Clone)]
    pub struct CreateUserCommand {
        pub email: String,
        pub password: String,
        pub full_name: Option<String>,
        pub is_active: bool,
        pub is_admin: bool,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateUserCommand {
        pub email: Option<String>,
        pub full_name: Option<Option<String>>,
        pub is_active: Option<bool>,
        pub is_admin: Option<bool>,
    }

    /// Outcome of a forgot-password request; `token` is set only for known accounts
    #[derive(Debug, Clone)]
    pub struct ForgotPasswordResult {
        pub message: String,
        pub token: Option<String>,
    }

    /// An unused, unexpired reset for the admin listing
    #[derive(Debug, Clone)]
    pub struct ActiveReset {
        pub user_email: String,
        pub short_code: String,
        pub created_at: DateTime<Utc>,
        pub expires_at: DateTime<Utc>,
        pub minutes_remaining: i64,
    }

    #[derive(Debug, Clone)]
    pub struct ResetLinkResult {
        pub user: User,
        pub token: String,
        pub short_code: String,
        pub expires_in_minutes: i64,
    }
}

pub mod backups {
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, PartialEq)]
    pub struct BackupFile {
        pub filename: String,
        pub size: u64,
        pub created_at: DateTime<Utc>,
    }
}
