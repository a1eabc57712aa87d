//! Month lifecycle: creation, lookup, edits, closing and reopening.
//!
//! ## Business Rules
//!
//! - One month per (year, month); the name and date range are derived
//! - Month names are unique, including names set by hand
//! - A closed month rejects changes to its expenses and incomes
//! - Deleting a month removes its expenses and incomes with it

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::calendar;
use crate::domain::commands::months::{CreateMonthCommand, MonthStatusResult, UpdateMonthCommand};
use crate::domain::error::{BudgetError, BudgetResult};
use crate::domain::models::month::{Month, NewMonth};
use crate::storage::{Connection, MonthStorage};

#[derive(Clone)]
pub struct MonthService<C: Connection> {
    month_repository: C::MonthRepository,
}

impl<C: Connection> MonthService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
        }
    }

    pub async fn create_month(&self, command: CreateMonthCommand, user: Option<&str>) -> BudgetResult<Month> {
        info!("Creating month {}-{:02}", command.year, command.month);
        calendar::validate_month_number(command.month)?;

        if self
            .month_repository
            .get_month_by_year_month(command.year, command.month)
            .await?
            .is_some()
        {
            return Err(BudgetError::conflict(format!(
                "Month {} already exists",
                calendar::month_name(command.year, command.month)?
            )));
        }

        let new_month = Self::new_month(command.year, command.month)?;
        self.ensure_name_free(&new_month.name, None).await?;

        let month = self.month_repository.insert_month(&new_month, user).await?;
        info!("Created month {} with ID {}", month.name, month.id);
        Ok(month)
    }

    /// Return the month for (year, month), creating it when missing.
    /// The flag is true when a new month was inserted.
    pub async fn get_or_create_month(
        &self,
        year: i32,
        month: u32,
        user: Option<&str>,
    ) -> BudgetResult<(Month, bool)> {
        if let Some(existing) = self.month_repository.get_month_by_year_month(year, month).await? {
            return Ok((existing, false));
        }

        let new_month = Self::new_month(year, month)?;
        self.ensure_name_free(&new_month.name, None).await?;

        let created = self.month_repository.insert_month(&new_month, user).await?;
        info!("Created month {} with ID {}", created.name, created.id);
        Ok((created, true))
    }

    pub async fn get_month(&self, month_id: i64) -> BudgetResult<Month> {
        self.month_repository
            .get_month(month_id)
            .await?
            .ok_or_else(|| BudgetError::not_found(format!("Month with ID {} not found", month_id)))
    }

    pub async fn get_month_by_year_month(&self, year: i32, month: u32) -> BudgetResult<Month> {
        self.month_repository
            .get_month_by_year_month(year, month)
            .await?
            .ok_or_else(|| BudgetError::not_found(format!("Month {}-{:02} not found", year, month)))
    }

    /// All months, newest first
    pub async fn list_months(&self) -> BudgetResult<Vec<Month>> {
        let months = self.month_repository.list_months().await?;
        info!("Found {} months", months.len());
        Ok(months)
    }

    /// The month containing today, falling back to the most recent month
    pub async fn current_month(&self) -> BudgetResult<Month> {
        self.current_month_at(calendar::today()).await
    }

    pub async fn current_month_at(&self, today: NaiveDate) -> BudgetResult<Month> {
        let (year, month) = calendar::year_month_of(today);
        if let Some(current) = self.month_repository.get_month_by_year_month(year, month).await? {
            return Ok(current);
        }

        warn!("No month for {}-{:02}, falling back to most recent", year, month);
        self.month_repository
            .list_months()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BudgetError::not_found("No months found in database"))
    }

    pub async fn update_month(
        &self,
        month_id: i64,
        command: UpdateMonthCommand,
        user: Option<&str>,
    ) -> BudgetResult<Month> {
        info!("Updating month {}: {:?}", month_id, command);
        let mut month = self.get_month(month_id).await?;

        if let Some(name) = command.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BudgetError::validation("Month name cannot be empty"));
            }
            month.name = name;
        }
        if let Some(start_date) = &command.start_date {
            month.start_date = calendar::parse_date("start_date", start_date)?;
        }
        if let Some(end_date) = &command.end_date {
            month.end_date = calendar::parse_date("end_date", end_date)?;
        }

        // A new year or month regenerates the derived fields
        if command.year.is_some() || command.month.is_some() {
            let year = command.year.unwrap_or(month.year);
            let month_number = command.month.unwrap_or(month.month);
            calendar::validate_month_number(month_number)?;

            let moved = year != month.year || month_number != month.month;
            if moved
                && self
                    .month_repository
                    .get_month_by_year_month(year, month_number)
                    .await?
                    .is_some()
            {
                return Err(BudgetError::conflict(format!(
                    "Month {} already exists",
                    calendar::month_name(year, month_number)?
                )));
            }

            let (start_date, end_date) = calendar::month_bounds(year, month_number)?;
            month.year = year;
            month.month = month_number;
            month.name = calendar::month_name(year, month_number)?;
            month.start_date = start_date;
            month.end_date = end_date;
        }

        self.ensure_name_free(&month.name, Some(month.id)).await?;

        let updated = self.month_repository.update_month(&month, user).await?;
        info!("Updated month {} with ID {}", updated.name, updated.id);
        Ok(updated)
    }

    /// Delete a month and everything recorded in it
    pub async fn delete_month(&self, month_id: i64) -> BudgetResult<()> {
        let month = self.get_month(month_id).await?;
        self.month_repository.delete_month(month_id).await?;
        info!("Deleted month {} with ID {}", month.name, month_id);
        Ok(())
    }

    pub async fn close_month(&self, month_id: i64, user: Option<&str>) -> BudgetResult<MonthStatusResult> {
        let mut month = self.get_month(month_id).await?;
        if month.is_closed {
            return Err(BudgetError::validation(format!("Month '{}' is already closed", month.name)));
        }

        month.is_closed = true;
        month.closed_at = Some(Utc::now());
        month.closed_by = user.map(str::to_string);
        let month = self.month_repository.update_month(&month, user).await?;

        info!("Closed month {} with ID {}", month.name, month.id);
        Ok(MonthStatusResult {
            message: format!("Month '{}' has been closed", month.name),
            month,
        })
    }

    pub async fn open_month(&self, month_id: i64, user: Option<&str>) -> BudgetResult<MonthStatusResult> {
        let mut month = self.get_month(month_id).await?;
        if !month.is_closed {
            return Err(BudgetError::validation(format!("Month '{}' is not closed", month.name)));
        }

        month.is_closed = false;
        month.closed_at = None;
        month.closed_by = None;
        let month = self.month_repository.update_month(&month, user).await?;

        info!("Reopened month {} with ID {}", month.name, month.id);
        Ok(MonthStatusResult {
            message: format!("Month '{}' has been reopened", month.name),
            month,
        })
    }

    pub async fn is_month_closed(&self, month_id: i64) -> BudgetResult<bool> {
        Ok(self.get_month(month_id).await?.is_closed)
    }

    /// Load a month that is about to receive changes.
    ///
    /// Fails with a validation error naming `action` when the month is missing
    /// or closed.
    pub async fn require_open_month(&self, month_id: i64, action: &str) -> BudgetResult<Month> {
        let month = self
            .month_repository
            .get_month(month_id)
            .await?
            .ok_or_else(|| BudgetError::validation(format!("Month with ID {} not found", month_id)))?;

        if month.is_closed {
            warn!("Rejected '{}' on closed month {}", action, month.name);
            return Err(BudgetError::validation(format!(
                "Cannot {}: Month '{}' is closed",
                action, month.name
            )));
        }
        Ok(month)
    }

    /// Month names are unique; `except` is the month being edited
    async fn ensure_name_free(&self, name: &str, except: Option<i64>) -> BudgetResult<()> {
        match self.month_repository.get_month_by_name(name).await? {
            Some(other) if Some(other.id) != except => {
                warn!("Month name '{}' already used by month {}", name, other.id);
                Err(BudgetError::conflict(format!("Month {} already exists", name)))
            }
            _ => Ok(()),
        }
    }

    fn new_month(year: i32, month: u32) -> BudgetResult<NewMonth> {
        let (start_date, end_date) = calendar::month_bounds(year, month)?;
        Ok(NewMonth {
            year,
            month,
            name: calendar::month_name(year, month)?,
            start_date,
            end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;

    async fn setup_test() -> MonthService<DbConnection> {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        MonthService::new(Arc::new(db))
    }

    fn create(year: i32, month: u32) -> CreateMonthCommand {
        CreateMonthCommand { year, month }
    }

    #[tokio::test]
    async fn test_create_month_derives_name_and_dates() {
        let service = setup_test().await;

        let month = service.create_month(create(2024, 2), Some("alice")).await.unwrap();
        assert_eq!(month.name, "February 2024");
        assert_eq!(month.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(month.end_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(!month.is_closed);
        assert_eq!(month.created_by.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_create_month_validation_and_conflict() {
        let service = setup_test().await;

        let err = service.create_month(create(2024, 13), None).await.unwrap_err();
        assert!(matches!(err, BudgetError::Validation(_)));

        service.create_month(create(2024, 11), None).await.unwrap();
        let err = service.create_month(create(2024, 11), None).await.unwrap_err();
        assert!(matches!(err, BudgetError::Conflict(_)));
        assert_eq!(err.to_string(), "Month November 2024 already exists");
    }

    #[tokio::test]
    async fn test_lookup_errors() {
        let service = setup_test().await;

        let err = service.get_month(42).await.unwrap_err();
        assert_eq!(err.to_string(), "Month with ID 42 not found");

        let err = service.get_month_by_year_month(2024, 3).await.unwrap_err();
        assert_eq!(err.to_string(), "Month 2024-03 not found");
        assert!(matches!(err, BudgetError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_current_month_falls_back_to_most_recent() {
        let service = setup_test().await;
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let err = service.current_month_at(today).await.unwrap_err();
        assert_eq!(err.to_string(), "No months found in database");

        service.create_month(create(2024, 1), None).await.unwrap();
        service.create_month(create(2024, 3), None).await.unwrap();
        assert_eq!(service.current_month_at(today).await.unwrap().name, "March 2024");

        service.create_month(create(2024, 6), None).await.unwrap();
        assert_eq!(service.current_month_at(today).await.unwrap().name, "June 2024");
    }

    #[tokio::test]
    async fn test_update_month_regenerates_derived_fields() {
        let service = setup_test().await;
        let month = service.create_month(create(2024, 1), None).await.unwrap();
        service.create_month(create(2024, 5), None).await.unwrap();

        let command = UpdateMonthCommand { month: Some(4), ..Default::default() };
        let updated = service.update_month(month.id, command, Some("bob")).await.unwrap();
        assert_eq!(updated.name, "April 2024");
        assert_eq!(updated.end_date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(updated.updated_by.as_deref(), Some("bob"));

        let command = UpdateMonthCommand { month: Some(5), ..Default::default() };
        let err = service.update_month(month.id, command, None).await.unwrap_err();
        assert!(matches!(err, BudgetError::Conflict(_)));

        let command = UpdateMonthCommand { start_date: Some("April 2nd".to_string()), ..Default::default() };
        let err = service.update_month(month.id, command, None).await.unwrap_err();
        assert!(matches!(err, BudgetError::Validation(_)));

        let command = UpdateMonthCommand { name: Some("Spring".to_string()), ..Default::default() };
        assert_eq!(service.update_month(month.id, command, None).await.unwrap().name, "Spring");
    }

    #[tokio::test]
    async fn test_month_names_stay_unique() {
        let service = setup_test().await;
        let january = service.create_month(create(2024, 1), None).await.unwrap();
        let may = service.create_month(create(2024, 5), None).await.unwrap();

        // Taking a name another month will derive later blocks that month
        let command = UpdateMonthCommand { name: Some("March 2024".to_string()), ..Default::default() };
        service.update_month(january.id, command, None).await.unwrap();
        let err = service.create_month(create(2024, 3), None).await.unwrap_err();
        assert!(matches!(err, BudgetError::Conflict(_)));
        assert_eq!(err.to_string(), "Month March 2024 already exists");
        assert!(service.get_or_create_month(2024, 3, None).await.is_err());

        // Renaming onto another month's name is refused, keeping its own name is not
        let command = UpdateMonthCommand { name: Some("May 2024".to_string()), ..Default::default() };
        let err = service.update_month(january.id, command, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Month May 2024 already exists");

        let command = UpdateMonthCommand { name: Some("May 2024".to_string()), ..Default::default() };
        assert_eq!(service.update_month(may.id, command, None).await.unwrap().name, "May 2024");

        let command = UpdateMonthCommand { name: Some("  ".to_string()), ..Default::default() };
        let err = service.update_month(may.id, command, None).await.unwrap_err();
        assert!(matches!(err, BudgetError::Validation(_)));
    }

    #[tokio::test]
    async fn test_close_and_open_month() {
        let service = setup_test().await;
        let month = service.create_month(create(2024, 7), None).await.unwrap();

        let closed = service.close_month(month.id, Some("carol")).await.unwrap();
        assert_eq!(closed.message, "Month 'July 2024' has been closed");
        assert!(closed.month.is_closed);
        assert!(closed.month.closed_at.is_some());
        assert_eq!(closed.month.closed_by.as_deref(), Some("carol"));
        assert!(service.is_month_closed(month.id).await.unwrap());

        let err = service.close_month(month.id, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Month 'July 2024' is already closed");

        let err = service.require_open_month(month.id, "add expense").await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot add expense: Month 'July 2024' is closed");

        let opened = service.open_month(month.id, None).await.unwrap();
        assert_eq!(opened.message, "Month 'July 2024' has been reopened");
        assert!(opened.month.closed_at.is_none());
        assert!(opened.month.closed_by.is_none());

        let err = service.open_month(month.id, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Month 'July 2024' is not closed");
    }

    #[tokio::test]
    async fn test_get_or_create_and_delete() {
        let service = setup_test().await;

        let (month, created) = service.get_or_create_month(2025, 1, None).await.unwrap();
        assert!(created);
        let (again, created) = service.get_or_create_month(2025, 1, None).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, month.id);

        service.delete_month(month.id).await.unwrap();
        assert!(matches!(service.delete_month(month.id).await, Err(BudgetError::NotFound(_))));
    }
}
