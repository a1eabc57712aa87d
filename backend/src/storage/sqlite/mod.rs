//! # SQLite Storage Module
//!
//! - **connection.rs** - pool setup, schema creation and the repository factory
//! - **\*_repository.rs** - one repository per aggregate

pub mod backup_repository;
pub mod connection;
pub mod expense_repository;
pub mod income_repository;
pub mod label_repository;
pub mod month_repository;
pub mod seed_repository;
pub mod user_repository;

pub use backup_repository::BackupRepository;
pub use connection::DbConnection;
pub use expense_repository::ExpenseRepository;
pub use income_repository::IncomeRepository;
pub use label_repository::LabelRepository;
pub use month_repository::MonthRepository;
pub use seed_repository::SeedRepository;
pub use user_repository::UserRepository;
