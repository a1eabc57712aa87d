use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::domain::models::expense::{Expense, NewExpense, Purchase};
use crate::domain::models::income::NewIncome;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::sqlite::income_repository::insert_income_row;
use crate::storage::traits::{ExpenseQuery, ExpenseStorage};

const EXPENSE_COLUMNS: &str = "id, expense_name, period, category, budget, cost, notes, month_id, \
    purchases, sort_order, expense_date, created_at, updated_at, created_by, updated_by";

/// Repository for expense operations
#[derive(Clone)]
pub struct ExpenseRepository {
    db: DbConnection,
}

impl ExpenseRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_expense(row: &SqliteRow) -> Result<Expense> {
        let purchases: Option<String> = row.try_get("purchases")?;
        let purchases = match purchases {
            Some(json) => Some(serde_json::from_str::<Vec<Purchase>>(&json)?),
            None => None,
        };

        Ok(Expense {
            id: row.try_get("id")?,
            expense_name: row.try_get("expense_name")?,
            period: row.try_get("period")?,
            category: row.try_get("category")?,
            budget: row.try_get("budget")?,
            cost: row.try_get("cost")?,
            notes: row.try_get("notes")?,
            month_id: row.try_get("month_id")?,
            purchases,
            order: row.try_get("sort_order")?,
            expense_date: row.try_get("expense_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
        })
    }

    fn purchases_json(purchases: &Option<Vec<Purchase>>) -> Result<Option<String>> {
        Ok(match purchases {
            Some(list) => Some(serde_json::to_string(list)?),
            None => None,
        })
    }

    async fn insert_expense_row(
        conn: &mut SqliteConnection,
        expense: &NewExpense,
        user: Option<&str>,
    ) -> Result<i64> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO expenses (expense_name, period, category, budget, cost, notes, month_id,
                                  purchases, sort_order, expense_date,
                                  created_at, updated_at, created_by, updated_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.expense_name)
        .bind(&expense.period)
        .bind(&expense.category)
        .bind(expense.budget)
        .bind(expense.cost)
        .bind(&expense.notes)
        .bind(expense.month_id)
        .bind(Self::purchases_json(&expense.purchases)?)
        .bind(expense.order)
        .bind(expense.expense_date)
        .bind(now)
        .bind(now)
        .bind(user)
        .bind(user)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl ExpenseStorage for ExpenseRepository {
    async fn insert_expense(&self, expense: &NewExpense, user: Option<&str>) -> Result<Expense> {
        let mut conn = self.db.pool().acquire().await?;
        let id = Self::insert_expense_row(&mut *conn, expense, user).await?;
        drop(conn);

        self.get_expense(id)
            .await?
            .ok_or_else(|| anyhow!("Expense {} vanished after insert", id))
    }

    async fn insert_batch(
        &self,
        expenses: &[NewExpense],
        incomes: &[NewIncome],
        user: Option<&str>,
    ) -> Result<(u64, u64)> {
        let mut tx = self.db.pool().begin().await?;

        for expense in expenses {
            Self::insert_expense_row(&mut *tx, expense, user).await?;
        }
        for income in incomes {
            insert_income_row(&mut *tx, income, user).await?;
        }

        tx.commit().await?;
        Ok((expenses.len() as u64, incomes.len() as u64))
    }

    async fn get_expense(&self, expense_id: i64) -> Result<Option<Expense>> {
        let row = sqlx::query(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?"))
            .bind(expense_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_expense).transpose()
    }

    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE 1 = 1"));

        if let Some(period) = &query.period {
            builder.push(" AND period = ").push_bind(period.clone());
        }
        if let Some(category) = &query.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(month_id) = query.month_id {
            builder.push(" AND month_id = ").push_bind(month_id);
        }
        builder.push(" ORDER BY sort_order ASC, expense_name ASC");

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_expense).collect()
    }

    async fn update_expense(&self, expense: &Expense, user: Option<&str>) -> Result<Expense> {
        sqlx::query(
            r#"
            UPDATE expenses
            SET expense_name = ?, period = ?, category = ?, budget = ?, cost = ?, notes = ?,
                month_id = ?, purchases = ?, sort_order = ?, expense_date = ?,
                updated_at = ?, updated_by = COALESCE(?, updated_by)
            WHERE id = ?
            "#,
        )
        .bind(&expense.expense_name)
        .bind(&expense.period)
        .bind(&expense.category)
        .bind(expense.budget)
        .bind(expense.cost)
        .bind(&expense.notes)
        .bind(expense.month_id)
        .bind(Self::purchases_json(&expense.purchases)?)
        .bind(expense.order)
        .bind(expense.expense_date)
        .bind(Utc::now())
        .bind(user)
        .bind(expense.id)
        .execute(self.db.pool())
        .await?;

        self.get_expense(expense.id)
            .await?
            .ok_or_else(|| anyhow!("Expense {} not found after update", expense.id))
    }

    async fn delete_expense(&self, expense_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(expense_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn max_order(&self, month_id: i64) -> Result<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(sort_order) FROM expenses WHERE month_id = ?")
            .bind(month_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(max)
    }

    async fn reorder_expenses(&self, expense_ids: &[i64], user: Option<&str>) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        let now = Utc::now();

        for (position, expense_id) in expense_ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE expenses SET sort_order = ?, updated_at = ?, updated_by = COALESCE(?, updated_by) \
                 WHERE id = ?",
            )
            .bind(position as i64)
            .bind(now)
            .bind(user)
            .bind(*expense_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back earlier positions
                bail!("Expense {} not found while reordering", expense_id);
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::month::NewMonth;
    use crate::storage::sqlite::month_repository::MonthRepository;
    use crate::storage::traits::MonthStorage;
    use chrono::NaiveDate;

    async fn setup_test() -> (ExpenseRepository, i64) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let month = MonthRepository::new(db.clone())
            .insert_month(
                &NewMonth {
                    year: 2024,
                    month: 11,
                    name: "November 2024".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(),
                },
                None,
            )
            .await
            .unwrap();
        (ExpenseRepository::new(db), month.id)
    }

    fn new_expense(name: &str, month_id: i64, order: i64) -> NewExpense {
        NewExpense {
            expense_name: name.to_string(),
            period: "1st Period".to_string(),
            category: "Groceries".to_string(),
            budget: 100.0,
            cost: 0.0,
            notes: None,
            month_id,
            purchases: None,
            order,
            expense_date: NaiveDate::from_ymd_opt(2024, 11, 5),
        }
    }

    #[tokio::test]
    async fn test_insert_expense_with_purchases() {
        let (repo, month_id) = setup_test().await;
        let mut expense = new_expense("Food", month_id, 0);
        expense.purchases = Some(vec![Purchase {
            name: "Market".to_string(),
            amount: 42.5,
            date: NaiveDate::from_ymd_opt(2024, 11, 2),
        }]);
        expense.cost = 42.5;

        let created = repo.insert_expense(&expense, Some("alice")).await.unwrap();
        assert_eq!(created.cost, 42.5);
        assert_eq!(created.purchases.as_ref().map(Vec::len), Some(1));
        assert_eq!(created.expense_date, NaiveDate::from_ymd_opt(2024, 11, 5));
        assert_eq!(created.created_by.as_deref(), Some("alice"));

        let fetched = repo.get_expense(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_expenses_filters_and_ordering() {
        let (repo, month_id) = setup_test().await;
        repo.insert_expense(&new_expense("Zoo", month_id, 0), None).await.unwrap();
        repo.insert_expense(&new_expense("Apples", month_id, 1), None).await.unwrap();
        repo.insert_expense(&new_expense("Bananas", month_id, 1), None).await.unwrap();
        let mut rent = new_expense("Rent", month_id, 2);
        rent.category = "Rent/Utilities".to_string();
        repo.insert_expense(&rent, None).await.unwrap();

        let all = repo
            .list_expenses(&ExpenseQuery { month_id: Some(month_id), ..Default::default() })
            .await
            .unwrap();
        let names: Vec<&str> = all.iter().map(|e| e.expense_name.as_str()).collect();
        assert_eq!(names, vec!["Zoo", "Apples", "Bananas", "Rent"]);

        let groceries = repo
            .list_expenses(&ExpenseQuery { category: Some("Groceries".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(groceries.len(), 3);

        let none = repo
            .list_expenses(&ExpenseQuery { period: Some("2nd Period".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_clears_purchases() {
        let (repo, month_id) = setup_test().await;
        let mut expense = new_expense("Food", month_id, 0);
        expense.purchases = Some(vec![Purchase { name: "Deli".to_string(), amount: 9.0, date: None }]);
        let mut created = repo.insert_expense(&expense, Some("alice")).await.unwrap();

        created.purchases = None;
        created.notes = Some("cleared".to_string());
        let updated = repo.update_expense(&created, Some("bob")).await.unwrap();

        assert!(updated.purchases.is_none());
        assert_eq!(updated.notes.as_deref(), Some("cleared"));
        assert_eq!(updated.created_by.as_deref(), Some("alice"));
        assert_eq!(updated.updated_by.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_max_order_and_delete() {
        let (repo, month_id) = setup_test().await;
        assert_eq!(repo.max_order(month_id).await.unwrap(), None);

        let first = repo.insert_expense(&new_expense("A", month_id, 3), None).await.unwrap();
        repo.insert_expense(&new_expense("B", month_id, 7), None).await.unwrap();
        assert_eq!(repo.max_order(month_id).await.unwrap(), Some(7));

        assert!(repo.delete_expense(first.id).await.unwrap());
        assert!(!repo.delete_expense(first.id).await.unwrap());
        assert!(repo.get_expense(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reorder_is_atomic() {
        let (repo, month_id) = setup_test().await;
        let a = repo.insert_expense(&new_expense("A", month_id, 0), None).await.unwrap();
        let b = repo.insert_expense(&new_expense("B", month_id, 1), None).await.unwrap();

        repo.reorder_expenses(&[b.id, a.id], None).await.unwrap();
        assert_eq!(repo.get_expense(b.id).await.unwrap().unwrap().order, 0);
        assert_eq!(repo.get_expense(a.id).await.unwrap().unwrap().order, 1);

        // Unknown id fails and leaves the previous order untouched
        assert!(repo.reorder_expenses(&[a.id, 9999], None).await.is_err());
        assert_eq!(repo.get_expense(a.id).await.unwrap().unwrap().order, 1);
    }

    #[tokio::test]
    async fn test_insert_batch_writes_expenses_and_incomes() {
        let (repo, month_id) = setup_test().await;
        let now = Utc::now();
        let type_id = sqlx::query(
            "INSERT INTO income_types (name, color, created_at, updated_at) VALUES ('Salary', '#10b981', ?, ?)",
        )
        .bind(now)
        .bind(now)
        .execute(repo.db.pool())
        .await
        .unwrap()
        .last_insert_rowid();

        let incomes = vec![NewIncome {
            income_type_id: type_id,
            period: "1st Period".to_string(),
            budget: 2000.0,
            amount: 0.0,
            month_id,
        }];
        let expenses = vec![new_expense("A", month_id, 0), new_expense("B", month_id, 1)];

        let counts = repo.insert_batch(&expenses, &incomes, Some("alice")).await.unwrap();
        assert_eq!(counts, (2, 1));

        let income_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM incomes WHERE month_id = ?")
            .bind(month_id)
            .fetch_one(repo.db.pool())
            .await
            .unwrap();
        assert_eq!(income_count, 1);
    }
}
