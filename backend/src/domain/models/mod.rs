pub mod expense;
pub mod income;
pub mod label;
pub mod month;
pub mod user;
