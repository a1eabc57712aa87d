use anyhow::{Context, Result};
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::{
    backup_repository::BackupRepository, expense_repository::ExpenseRepository,
    income_repository::IncomeRepository, label_repository::LabelRepository,
    month_repository::MonthRepository, seed_repository::SeedRepository,
    user_repository::UserRepository,
};
use crate::storage::traits::Connection;

/// DbConnection owns the SQLite pool and hands out repositories
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("Failed to create database at {}", url))?;
        }

        let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::setup_schema(&pool).await?;
        info!("Database ready at {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a private in-memory database with a unique name
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS months (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL CHECK (month >= 1 AND month <= 12),
                name TEXT NOT NULL UNIQUE,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                is_closed BOOLEAN NOT NULL DEFAULT FALSE,
                closed_at TEXT,
                closed_by TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                UNIQUE (year, month)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                expense_name TEXT NOT NULL,
                period TEXT NOT NULL,
                category TEXT NOT NULL,
                budget REAL NOT NULL DEFAULT 0,
                cost REAL NOT NULL DEFAULT 0,
                notes TEXT,
                month_id INTEGER NOT NULL,
                purchases TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                expense_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                FOREIGN KEY (month_id) REFERENCES months (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_expenses_month_id ON expenses(month_id);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_expenses_period ON expenses(period);")
            .execute(pool)
            .await?;

        // Label tables share one shape
        for table in ["categories", "periods", "income_types"] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    color TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    created_by TEXT,
                    updated_by TEXT
                );
                "#
            ))
            .execute(pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS incomes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                income_type_id INTEGER NOT NULL,
                period TEXT NOT NULL,
                budget REAL NOT NULL DEFAULT 0,
                amount REAL NOT NULL DEFAULT 0,
                month_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                FOREIGN KEY (month_id) REFERENCES months (id) ON DELETE CASCADE,
                FOREIGN KEY (income_type_id) REFERENCES income_types (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_incomes_month_id ON incomes(month_id);")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                full_name TEXT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_admin BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS password_reset_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                token TEXT NOT NULL UNIQUE,
                short_code TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                used BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seed_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                seed_id TEXT NOT NULL UNIQUE,
                executed_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

impl Connection for DbConnection {
    type MonthRepository = MonthRepository;
    type ExpenseRepository = ExpenseRepository;
    type IncomeRepository = IncomeRepository;
    type LabelRepository = LabelRepository;
    type SeedRepository = SeedRepository;
    type UserRepository = UserRepository;
    type BackupRepository = BackupRepository;

    fn create_month_repository(&self) -> Self::MonthRepository {
        MonthRepository::new(self.clone())
    }

    fn create_expense_repository(&self) -> Self::ExpenseRepository {
        ExpenseRepository::new(self.clone())
    }

    fn create_income_repository(&self) -> Self::IncomeRepository {
        IncomeRepository::new(self.clone())
    }

    fn create_label_repository(&self) -> Self::LabelRepository {
        LabelRepository::new(self.clone())
    }

    fn create_seed_repository(&self) -> Self::SeedRepository {
        SeedRepository::new(self.clone())
    }

    fn create_user_repository(&self) -> Self::UserRepository {
        UserRepository::new(self.clone())
    }

    fn create_backup_repository(&self) -> Self::BackupRepository {
        BackupRepository::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_schema_is_created() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let tables: Vec<String> = rows.iter().map(|r| r.get("name")).collect();

        for expected in [
            "categories",
            "expenses",
            "income_types",
            "incomes",
            "months",
            "password_reset_tokens",
            "periods",
            "seed_records",
            "users",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_file_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("budget.db").display());

        let first = DbConnection::new(&url).await.unwrap();
        sqlx::query(
            "INSERT INTO seed_records (seed_id, executed_at) VALUES ('reconnect', '2024-01-01T00:00:00Z')",
        )
        .execute(first.pool())
        .await
        .unwrap();
        first.pool().close().await;

        let second = DbConnection::new(&url).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seed_records")
            .fetch_one(second.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
