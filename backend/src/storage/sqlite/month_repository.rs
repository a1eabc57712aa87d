use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::month::{Month, NewMonth};
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::MonthStorage;

const MONTH_COLUMNS: &str = "id, year, month, name, start_date, end_date, is_closed, closed_at, \
    closed_by, created_at, updated_at, created_by, updated_by";

/// Repository for month operations
#[derive(Clone)]
pub struct MonthRepository {
    db: DbConnection,
}

impl MonthRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_month(row: &SqliteRow) -> Result<Month> {
        let month: i64 = row.try_get("month")?;
        Ok(Month {
            id: row.try_get("id")?,
            year: row.try_get("year")?,
            month: u32::try_from(month)?,
            name: row.try_get("name")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            is_closed: row.try_get("is_closed")?,
            closed_at: row.try_get("closed_at")?,
            closed_by: row.try_get("closed_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
        })
    }
}

#[async_trait]
impl MonthStorage for MonthRepository {
    async fn insert_month(&self, month: &NewMonth, user: Option<&str>) -> Result<Month> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO months (year, month, name, start_date, end_date, is_closed,
                                created_at, updated_at, created_by, updated_by)
            VALUES (?, ?, ?, ?, ?, FALSE, ?, ?, ?, ?)
            "#,
        )
        .bind(month.year)
        .bind(month.month)
        .bind(&month.name)
        .bind(month.start_date)
        .bind(month.end_date)
        .bind(now)
        .bind(now)
        .bind(user)
        .bind(user)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.get_month(id)
            .await?
            .ok_or_else(|| anyhow!("Month {} vanished after insert", id))
    }

    async fn get_month(&self, month_id: i64) -> Result<Option<Month>> {
        let row = sqlx::query(&format!("SELECT {MONTH_COLUMNS} FROM months WHERE id = ?"))
            .bind(month_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_month).transpose()
    }

    async fn get_month_by_year_month(&self, year: i32, month: u32) -> Result<Option<Month>> {
        let row = sqlx::query(&format!(
            "SELECT {MONTH_COLUMNS} FROM months WHERE year = ? AND month = ?"
        ))
        .bind(year)
        .bind(month)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_month).transpose()
    }

    async fn get_month_by_name(&self, name: &str) -> Result<Option<Month>> {
        let row = sqlx::query(&format!("SELECT {MONTH_COLUMNS} FROM months WHERE name = ?"))
            .bind(name)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_month).transpose()
    }

    async fn list_months(&self) -> Result<Vec<Month>> {
        let rows = sqlx::query(&format!(
            "SELECT {MONTH_COLUMNS} FROM months ORDER BY year DESC, month DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::row_to_month).collect()
    }

    async fn update_month(&self, month: &Month, user: Option<&str>) -> Result<Month> {
        sqlx::query(
            r#"
            UPDATE months
            SET year = ?, month = ?, name = ?, start_date = ?, end_date = ?,
                is_closed = ?, closed_at = ?, closed_by = ?,
                updated_at = ?, updated_by = COALESCE(?, updated_by)
            WHERE id = ?
            "#,
        )
        .bind(month.year)
        .bind(month.month)
        .bind(&month.name)
        .bind(month.start_date)
        .bind(month.end_date)
        .bind(month.is_closed)
        .bind(month.closed_at)
        .bind(&month.closed_by)
        .bind(Utc::now())
        .bind(user)
        .bind(month.id)
        .execute(self.db.pool())
        .await?;

        self.get_month(month.id)
            .await?
            .ok_or_else(|| anyhow!("Month {} not found after update", month.id))
    }

    async fn delete_month(&self, month_id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM expenses WHERE month_id = ?")
            .bind(month_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM incomes WHERE month_id = ?")
            .bind(month_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM months WHERE id = ?")
            .bind(month_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
