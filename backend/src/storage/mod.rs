//! # Storage Module
//!
//! Persistence for months, expenses, incomes, labels, users and seed
//! bookkeeping, plus database backups.
//!
//! The domain layer is written against the traits in [`traits`]; the only
//! implementation today is SQLite through SQLx. Tests use private in-memory
//! databases created with [`DbConnection::init_test`].

pub mod sqlite;
pub mod traits;

// Re-export the main types that other modules need
pub use sqlite::DbConnection;
pub use traits::{
    BackupStorage, Connection, ExpenseQuery, ExpenseStorage, IncomeQuery, IncomeStorage,
    LabelStorage, MonthStorage, SeedStorage, UserStorage,
};
