//! Conversions between the public DTOs in `shared` and domain types.

pub mod backup_mapper;
pub mod expense_mapper;
pub mod income_mapper;
pub mod label_mapper;
pub mod month_mapper;
pub mod user_mapper;

pub use backup_mapper::BackupMapper;
pub use expense_mapper::ExpenseMapper;
pub use income_mapper::IncomeMapper;
pub use label_mapper::LabelMapper;
pub use month_mapper::MonthMapper;
pub use user_mapper::UserMapper;
