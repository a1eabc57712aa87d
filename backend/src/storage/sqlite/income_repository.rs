use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::domain::models::income::{Income, NewIncome};
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::{IncomeQuery, IncomeStorage};

const INCOME_COLUMNS: &str = "id, income_type_id, period, budget, amount, month_id, created_at, \
    updated_at, created_by, updated_by";

/// Insert one income row on an existing connection or transaction
pub(crate) async fn insert_income_row(
    conn: &mut SqliteConnection,
    income: &NewIncome,
    user: Option<&str>,
) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO incomes (income_type_id, period, budget, amount, month_id,
                             created_at, updated_at, created_by, updated_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(income.income_type_id)
    .bind(&income.period)
    .bind(income.budget)
    .bind(income.amount)
    .bind(income.month_id)
    .bind(now)
    .bind(now)
    .bind(user)
    .bind(user)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Repository for income operations
#[derive(Clone)]
pub struct IncomeRepository {
    db: DbConnection,
}

impl IncomeRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_income(row: &SqliteRow) -> Result<Income> {
        Ok(Income {
            id: row.try_get("id")?,
            income_type_id: row.try_get("income_type_id")?,
            period: row.try_get("period")?,
            budget: row.try_get("budget")?,
            amount: row.try_get("amount")?,
            month_id: row.try_get("month_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
        })
    }
}

#[async_trait]
impl IncomeStorage for IncomeRepository {
    async fn insert_income(&self, income: &NewIncome, user: Option<&str>) -> Result<Income> {
        let mut conn = self.db.pool().acquire().await?;
        let id = insert_income_row(&mut *conn, income, user).await?;
        drop(conn);

        self.get_income(id)
            .await?
            .ok_or_else(|| anyhow!("Income {} vanished after insert", id))
    }

    async fn get_income(&self, income_id: i64) -> Result<Option<Income>> {
        let row = sqlx::query(&format!("SELECT {INCOME_COLUMNS} FROM incomes WHERE id = ?"))
            .bind(income_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_income).transpose()
    }

    async fn list_incomes(&self, query: &IncomeQuery) -> Result<Vec<Income>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {INCOME_COLUMNS} FROM incomes WHERE 1 = 1"));

        if let Some(period) = &query.period {
            builder.push(" AND period = ").push_bind(period.clone());
        }
        if let Some(income_type_id) = query.income_type_id {
            builder.push(" AND income_type_id = ").push_bind(income_type_id);
        }
        if let Some(month_id) = query.month_id {
            builder.push(" AND month_id = ").push_bind(month_id);
        }
        builder.push(" ORDER BY income_type_id ASC, id ASC");

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_income).collect()
    }

    async fn update_income(&self, income: &Income, user: Option<&str>) -> Result<Income> {
        sqlx::query(
            r#"
            UPDATE incomes
            SET income_type_id = ?, period = ?, budget = ?, amount = ?, month_id = ?,
                updated_at = ?, updated_by = COALESCE(?, updated_by)
            WHERE id = ?
            "#,
        )
        .bind(income.income_type_id)
        .bind(&income.period)
        .bind(income.budget)
        .bind(income.amount)
        .bind(income.month_id)
        .bind(Utc::now())
        .bind(user)
        .bind(income.id)
        .execute(self.db.pool())
        .await?;

        self.get_income(income.id)
            .await?
            .ok_or_else(|| anyhow!("Income {} not found after update", income.id))
    }

    async fn delete_income(&self, income_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM incomes WHERE id = ?")
            .bind(income_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::label::LabelKind;
    use crate::domain::models::month::NewMonth;
    use crate::storage::sqlite::label_repository::LabelRepository;
    use crate::storage::sqlite::month_repository::MonthRepository;
    use crate::storage::traits::{LabelStorage, MonthStorage};
    use chrono::NaiveDate;

    struct Fixture {
        repo: IncomeRepository,
        month_id: i64,
        salary_id: i64,
        bonus_id: i64,
    }

    async fn setup_test() -> Fixture {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let month = MonthRepository::new(db.clone())
            .insert_month(
                &NewMonth {
                    year: 2024,
                    month: 5,
                    name: "May 2024".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                },
                None,
            )
            .await
            .unwrap();
        let labels = LabelRepository::new(db.clone());
        let salary = labels.insert_label(LabelKind::IncomeType, "Salary", "#10b981", None).await.unwrap();
        let bonus = labels.insert_label(LabelKind::IncomeType, "Bonus", "#10b981", None).await.unwrap();

        Fixture {
            repo: IncomeRepository::new(db),
            month_id: month.id,
            salary_id: salary.id,
            bonus_id: bonus.id,
        }
    }

    fn new_income(income_type_id: i64, period: &str, month_id: i64) -> NewIncome {
        NewIncome {
            income_type_id,
            period: period.to_string(),
            budget: 1000.0,
            amount: 250.0,
            month_id,
        }
    }

    #[tokio::test]
    async fn test_insert_update_delete_income() {
        let f = setup_test().await;

        let created = f
            .repo
            .insert_income(&new_income(f.salary_id, "1st Period", f.month_id), Some("alice"))
            .await
            .unwrap();
        assert_eq!(created.amount, 250.0);
        assert_eq!(created.created_by.as_deref(), Some("alice"));

        let mut changed = created.clone();
        changed.amount = 900.0;
        let updated = f.repo.update_income(&changed, Some("bob")).await.unwrap();
        assert_eq!(updated.amount, 900.0);
        assert_eq!(updated.updated_by.as_deref(), Some("bob"));

        assert!(f.repo.delete_income(created.id).await.unwrap());
        assert!(f.repo.get_income(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_incomes_ordered_by_type() {
        let f = setup_test().await;
        f.repo.insert_income(&new_income(f.bonus_id, "2nd Period", f.month_id), None).await.unwrap();
        f.repo.insert_income(&new_income(f.salary_id, "1st Period", f.month_id), None).await.unwrap();

        let all = f
            .repo
            .list_incomes(&IncomeQuery { month_id: Some(f.month_id), ..Default::default() })
            .await
            .unwrap();
        let types: Vec<i64> = all.iter().map(|i| i.income_type_id).collect();
        assert_eq!(types, vec![f.salary_id, f.bonus_id]);

        let first_period = f
            .repo
            .list_incomes(&IncomeQuery { period: Some("1st Period".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(first_period.len(), 1);
        assert_eq!(first_period[0].income_type_id, f.salary_id);

        let by_type = f
            .repo
            .list_incomes(&IncomeQuery { income_type_id: Some(f.bonus_id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_type.len(), 1);
    }
}
