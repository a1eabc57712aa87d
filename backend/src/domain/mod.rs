//! # Domain Module
//!
//! Business rules for the budget: months and their lifecycle, expenses with
//! itemized purchases, incomes, labels, summaries and seeding, plus the user
//! accounts and database backups that sit around them.
//!
//! Services are generic over [`crate::storage::Connection`] and return
//! [`BudgetError`] so the REST layer can translate failures into status codes.
//!
//! ## Module Organization
//!
//! - **calendar**: month names, date ranges and month arithmetic
//! - **month_service**: create, edit, close and reopen months
//! - **expense_service**: expenses, payments, reordering and cloning to the next month
//! - **income_service**: income lines per income type
//! - **label_service**: categories, periods and income types
//! - **summary_service**: totals, period rollups and monthly trends
//! - **seed_service**: default labels and the current month
//! - **user_service**: accounts, sign-in and password resets
//! - **token_service**: bearer tokens and signed backup download links
//! - **backup_service**: database copies in the backup directory

pub mod backup_service;
pub mod calendar;
pub mod commands;
pub mod error;
pub mod expense_service;
pub mod income_service;
pub mod label_service;
pub mod models;
pub mod month_service;
pub mod passwords;
pub mod seed_service;
pub mod summary_service;
pub mod token_service;
pub mod user_service;

pub use backup_service::BackupService;
pub use error::{BudgetError, BudgetResult};
pub use expense_service::ExpenseService;
pub use income_service::IncomeService;
pub use label_service::LabelService;
pub use month_service::MonthService;
pub use seed_service::SeedService;
pub use summary_service::SummaryService;
pub use token_service::TokenService;
pub use user_service::UserService;
