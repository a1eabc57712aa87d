use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::label::{Label, LabelKind, LabelUsage};
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::LabelStorage;

/// Repository for categories, periods and income types.
///
/// The three kinds live in separate tables with the same columns; the table is
/// picked from the `LabelKind`, never from user input.
#[derive(Clone)]
pub struct LabelRepository {
    db: DbConnection,
}

impl LabelRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_label(kind: LabelKind, row: &SqliteRow) -> Result<Label> {
        Ok(Label {
            id: row.try_get("id")?,
            kind,
            name: row.try_get("name")?,
            color: row.try_get("color")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
        })
    }

    async fn count(&self, sql: &str, value: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl LabelStorage for LabelRepository {
    async fn insert_label(
        &self,
        kind: LabelKind,
        name: &str,
        color: &str,
        user: Option<&str>,
    ) -> Result<Label> {
        let now = Utc::now();
        let result = sqlx::query(&format!(
            "INSERT INTO {} (name, color, created_at, updated_at, created_by, updated_by) \
             VALUES (?, ?, ?, ?, ?, ?)",
            kind.table()
        ))
        .bind(name)
        .bind(color)
        .bind(now)
        .bind(now)
        .bind(user)
        .bind(user)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.get_label(kind, id)
            .await?
            .ok_or_else(|| anyhow!("{} {} vanished after insert", kind.title(), id))
    }

    async fn get_label(&self, kind: LabelKind, label_id: i64) -> Result<Option<Label>> {
        let row = sqlx::query(&format!("SELECT * FROM {} WHERE id = ?", kind.table()))
            .bind(label_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(|r| Self::row_to_label(kind, &r)).transpose()
    }

    async fn get_label_by_name(&self, kind: LabelKind, name: &str) -> Result<Option<Label>> {
        let row = sqlx::query(&format!("SELECT * FROM {} WHERE name = ?", kind.table()))
            .bind(name)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(|r| Self::row_to_label(kind, &r)).transpose()
    }

    async fn list_labels(&self, kind: LabelKind) -> Result<Vec<Label>> {
        let rows = sqlx::query(&format!("SELECT * FROM {} ORDER BY name ASC", kind.table()))
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(|r| Self::row_to_label(kind, r)).collect()
    }

    async fn update_label(
        &self,
        existing: &Label,
        name: &str,
        color: &str,
        user: Option<&str>,
    ) -> Result<Label> {
        let kind = existing.kind;
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(&format!(
            "UPDATE {} SET name = ?, color = ?, updated_at = ?, updated_by = COALESCE(?, updated_by) \
             WHERE id = ?",
            kind.table()
        ))
        .bind(name)
        .bind(color)
        .bind(Utc::now())
        .bind(user)
        .bind(existing.id)
        .execute(&mut *tx)
        .await?;

        // Expenses and incomes reference categories and periods by name
        if existing.name != name {
            match kind {
                LabelKind::Category => {
                    sqlx::query("UPDATE expenses SET category = ? WHERE category = ?")
                        .bind(name)
                        .bind(&existing.name)
                        .execute(&mut *tx)
                        .await?;
                }
                LabelKind::Period => {
                    sqlx::query("UPDATE expenses SET period = ? WHERE period = ?")
                        .bind(name)
                        .bind(&existing.name)
                        .execute(&mut *tx)
                        .await?;
                    sqlx::query("UPDATE incomes SET period = ? WHERE period = ?")
                        .bind(name)
                        .bind(&existing.name)
                        .execute(&mut *tx)
                        .await?;
                }
                LabelKind::IncomeType => {}
            }
        }

        tx.commit().await?;

        self.get_label(kind, existing.id)
            .await?
            .ok_or_else(|| anyhow!("{} {} not found after update", kind.title(), existing.id))
    }

    async fn delete_label(&self, kind: LabelKind, label_id: i64) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(label_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn label_usage(&self, label: &Label) -> Result<LabelUsage> {
        let usage = match label.kind {
            LabelKind::Category => LabelUsage {
                expenses: self
                    .count("SELECT COUNT(*) FROM expenses WHERE category = ?", &label.name)
                    .await?,
                incomes: 0,
            },
            LabelKind::Period => LabelUsage {
                expenses: self
                    .count("SELECT COUNT(*) FROM expenses WHERE period = ?", &label.name)
                    .await?,
                incomes: self
                    .count("SELECT COUNT(*) FROM incomes WHERE period = ?", &label.name)
                    .await?,
            },
            LabelKind::IncomeType => {
                let incomes: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM incomes WHERE income_type_id = ?")
                        .bind(label.id)
                        .fetch_one(self.db.pool())
                        .await?;
                LabelUsage { expenses: 0, incomes }
            }
        };

        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test() -> LabelRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        LabelRepository::new(db)
    }

    async fn insert_month(repo: &LabelRepository) -> i64 {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO months (year, month, name, start_date, end_date, created_at, updated_at) \
             VALUES (2024, 6, 'June 2024', '2024-06-01', '2024-06-30', ?, ?)",
        )
        .bind(now)
        .bind(now)
        .execute(repo.db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn insert_expense(repo: &LabelRepository, month_id: i64, category: &str, period: &str) {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO expenses (expense_name, period, category, month_id, created_at, updated_at) \
             VALUES ('Thing', ?, ?, ?, ?, ?)",
        )
        .bind(period)
        .bind(category)
        .bind(month_id)
        .bind(now)
        .bind(now)
        .execute(repo.db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_kinds_are_kept_apart() {
        let repo = setup_test().await;
        repo.insert_label(LabelKind::Category, "Groceries", "#112233", Some("alice")).await.unwrap();
        repo.insert_label(LabelKind::Period, "Groceries", "#445566", None).await.unwrap();

        let categories = repo.list_labels(LabelKind::Category).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].color, "#112233");
        assert_eq!(categories[0].kind, LabelKind::Category);
        assert!(repo.list_labels(LabelKind::IncomeType).await.unwrap().is_empty());

        let by_name = repo.get_label_by_name(LabelKind::Period, "Groceries").await.unwrap().unwrap();
        assert_eq!(by_name.color, "#445566");
    }

    #[tokio::test]
    async fn test_list_labels_sorted_by_name() {
        let repo = setup_test().await;
        for name in ["Rent", "Health", "Bonus"] {
            repo.insert_label(LabelKind::Category, name, "#000000", None).await.unwrap();
        }

        let names: Vec<String> = repo
            .list_labels(LabelKind::Category)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Bonus", "Health", "Rent"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = setup_test().await;
        repo.insert_label(LabelKind::Category, "Rent", "#000000", None).await.unwrap();
        assert!(repo.insert_label(LabelKind::Category, "Rent", "#ffffff", None).await.is_err());
    }

    #[tokio::test]
    async fn test_rename_period_cascades_to_expenses_and_incomes() {
        let repo = setup_test().await;
        let month_id = insert_month(&repo).await;
        let period = repo.insert_label(LabelKind::Period, "1st Period", "#000000", None).await.unwrap();
        let salary = repo.insert_label(LabelKind::IncomeType, "Salary", "#10b981", None).await.unwrap();
        insert_expense(&repo, month_id, "Rent", "1st Period").await;

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO incomes (income_type_id, period, month_id, created_at, updated_at) \
             VALUES (?, '1st Period', ?, ?, ?)",
        )
        .bind(salary.id)
        .bind(month_id)
        .bind(now)
        .bind(now)
        .execute(repo.db.pool())
        .await
        .unwrap();

        let usage = repo.label_usage(&period).await.unwrap();
        assert_eq!(usage, LabelUsage { expenses: 1, incomes: 1 });

        let renamed = repo.update_label(&period, "Early Month", "#abcdef", Some("bob")).await.unwrap();
        assert_eq!(renamed.name, "Early Month");
        assert_eq!(renamed.color, "#abcdef");
        assert_eq!(renamed.updated_by.as_deref(), Some("bob"));

        let expense_period: String = sqlx::query_scalar("SELECT period FROM expenses")
            .fetch_one(repo.db.pool())
            .await
            .unwrap();
        let income_period: String = sqlx::query_scalar("SELECT period FROM incomes")
            .fetch_one(repo.db.pool())
            .await
            .unwrap();
        assert_eq!(expense_period, "Early Month");
        assert_eq!(income_period, "Early Month");

        let salary_usage = repo.label_usage(&salary).await.unwrap();
        assert_eq!(salary_usage, LabelUsage { expenses: 0, incomes: 1 });
    }

    #[tokio::test]
    async fn test_rename_category_and_delete_unused() {
        let repo = setup_test().await;
        let month_id = insert_month(&repo).await;
        let category = repo.insert_label(LabelKind::Category, "Food", "#000000", None).await.unwrap();
        let unused = repo.insert_label(LabelKind::Category, "Spare", "#000000", None).await.unwrap();
        insert_expense(&repo, month_id, "Food", "1st Period").await;

        let renamed = repo.update_label(&category, "Groceries", "#000000", None).await.unwrap();
        let usage = repo.label_usage(&renamed).await.unwrap();
        assert_eq!(usage.expenses, 1);
        assert!(!usage.is_unused());

        assert!(repo.label_usage(&unused).await.unwrap().is_unused());
        assert!(repo.delete_label(LabelKind::Category, unused.id).await.unwrap());
        assert!(repo.get_label(LabelKind::Category, unused.id).await.unwrap().is_none());
        assert!(!repo.delete_label(LabelKind::Category, unused.id).await.unwrap());
    }
}
