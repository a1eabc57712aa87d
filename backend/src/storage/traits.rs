//! # Storage Traits
//!
//! Storage abstractions the domain layer is written against. The SQLite
//! implementation lives in `storage::sqlite`; services only see these traits.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::domain::models::{
    expense::{Expense, NewExpense},
    income::{Income, NewIncome},
    label::{Label, LabelKind, LabelUsage},
    month::{Month, NewMonth},
    user::{NewUser, PasswordReset, User},
};

/// Filters for listing expenses; all set filters must match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseQuery {
    pub period: Option<String>,
    pub category: Option<String>,
    pub month_id: Option<i64>,
}

/// Filters for listing incomes; all set filters must match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeQuery {
    pub period: Option<String>,
    pub income_type_id: Option<i64>,
    pub month_id: Option<i64>,
}

#[async_trait]
pub trait MonthStorage: Send + Sync {
    /// Insert a month and return it with its assigned id
    async fn insert_month(&self, month: &NewMonth, user: Option<&str>) -> Result<Month>;

    async fn get_month(&self, month_id: i64) -> Result<Option<Month>>;

    async fn get_month_by_year_month(&self, year: i32, month: u32) -> Result<Option<Month>>;

    async fn get_month_by_name(&self, name: &str) -> Result<Option<Month>>;

    /// All months, most recent first
    async fn list_months(&self) -> Result<Vec<Month>>;

    /// Persist every mutable field of `month` and stamp the update
    async fn update_month(&self, month: &Month, user: Option<&str>) -> Result<Month>;

    /// Delete a month together with its expenses and incomes.
    /// Returns false if the month did not exist.
    async fn delete_month(&self, month_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait ExpenseStorage: Send + Sync {
    async fn insert_expense(&self, expense: &NewExpense, user: Option<&str>) -> Result<Expense>;

    /// Insert expenses and incomes in a single transaction.
    /// Returns the number of (expenses, incomes) written.
    async fn insert_batch(
        &self,
        expenses: &[NewExpense],
        incomes: &[NewIncome],
        user: Option<&str>,
    ) -> Result<(u64, u64)>;

    async fn get_expense(&self, expense_id: i64) -> Result<Option<Expense>>;

    /// Expenses matching the query, ordered by position then name
    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>>;

    async fn update_expense(&self, expense: &Expense, user: Option<&str>) -> Result<Expense>;

    async fn delete_expense(&self, expense_id: i64) -> Result<bool>;

    /// Highest position used in a month, if it has any expenses
    async fn max_order(&self, month_id: i64) -> Result<Option<i64>>;

    /// Assign each id its index as position, atomically
    async fn reorder_expenses(&self, expense_ids: &[i64], user: Option<&str>) -> Result<()>;
}

#[async_trait]
pub trait IncomeStorage: Send + Sync {
    async fn insert_income(&self, income: &NewIncome, user: Option<&str>) -> Result<Income>;

    async fn get_income(&self, income_id: i64) -> Result<Option<Income>>;

    /// Incomes matching the query, ordered by income type id
    async fn list_incomes(&self, query: &IncomeQuery) -> Result<Vec<Income>>;

    async fn update_income(&self, income: &Income, user: Option<&str>) -> Result<Income>;

    async fn delete_income(&self, income_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait LabelStorage: Send + Sync {
    async fn insert_label(
        &self,
        kind: LabelKind,
        name: &str,
        color: &str,
        user: Option<&str>,
    ) -> Result<Label>;

    async fn get_label(&self, kind: LabelKind, label_id: i64) -> Result<Option<Label>>;

    async fn get_label_by_name(&self, kind: LabelKind, name: &str) -> Result<Option<Label>>;

    /// All labels of a kind ordered by name
    async fn list_labels(&self, kind: LabelKind) -> Result<Vec<Label>>;

    /// Rename/recolor a label. Expenses and incomes that reference the old name
    /// are rewritten in the same transaction.
    async fn update_label(
        &self,
        existing: &Label,
        name: &str,
        color: &str,
        user: Option<&str>,
    ) -> Result<Label>;

    async fn delete_label(&self, kind: LabelKind, label_id: i64) -> Result<bool>;

    /// Count the expenses and incomes that reference a label
    async fn label_usage(&self, label: &Label) -> Result<LabelUsage>;
}

#[async_trait]
pub trait SeedStorage: Send + Sync {
    async fn seed_executed(&self, seed_id: &str) -> Result<bool>;

    async fn record_seed(&self, seed_id: &str) -> Result<()>;
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn insert_user(&self, user: &NewUser, created_by: Option<&str>) -> Result<User>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Exact, case-sensitive email match
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All users ordered by email
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Persist every mutable field of `user`, including the password hash
    async fn update_user(&self, user: &User, updated_by: Option<&str>) -> Result<User>;

    /// Delete a user and their reset tokens. Returns false if the user did not exist.
    async fn delete_user(&self, user_id: i64) -> Result<bool>;

    async fn insert_reset(
        &self,
        user_id: i64,
        token: &str,
        short_code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset>;

    /// Find a reset by its token or its short code, used or not
    async fn find_reset(&self, token_or_code: &str) -> Result<Option<PasswordReset>>;

    async fn mark_reset_used(&self, reset_id: i64) -> Result<()>;

    /// Unused, unexpired resets paired with the user's email, newest first
    async fn list_active_resets(&self, now: DateTime<Utc>) -> Result<Vec<(PasswordReset, String)>>;
}

#[async_trait]
pub trait BackupStorage: Send + Sync {
    /// Write a consistent copy of the whole database to `path`
    async fn backup_to(&self, path: &Path) -> Result<()>;
}

/// Factory for repositories over one storage backend.
///
/// Services are generic over this trait so tests and production share the same
/// code path regardless of where the data lives.
pub trait Connection: Send + Sync + Clone + 'static {
    type MonthRepository: MonthStorage + Clone;
    type ExpenseRepository: ExpenseStorage + Clone;
    type IncomeRepository: IncomeStorage + Clone;
    type LabelRepository: LabelStorage + Clone;
    type SeedRepository: SeedStorage + Clone;
    type UserRepository: UserStorage + Clone;
    type BackupRepository: BackupStorage + Clone;

    fn create_month_repository(&self) -> Self::MonthRepository;

    fn create_expense_repository(&self) -> Self::ExpenseRepository;

    fn create_income_repository(&self) -> Self::IncomeRepository;

    fn create_label_repository(&self) -> Self::LabelRepository;

    fn create_seed_repository(&self) -> Self::SeedRepository;

    fn create_user_repository(&self) -> Self::UserRepository;

    fn create_backup_repository(&self) -> Self::BackupRepository;
}
