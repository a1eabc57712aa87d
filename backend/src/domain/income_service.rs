//! Income service domain logic.
//!
//! Income lines belong to a month and an existing income type. Like expenses,
//! they can only be added, moved or removed while their month is open.

use std::sync::Arc;
use tracing::info;

use crate::domain::commands::incomes::{CreateIncomeCommand, UpdateIncomeCommand};
use crate::domain::error::{BudgetError, BudgetResult};
use crate::domain::models::income::{Income, NewIncome};
use crate::domain::models::label::LabelKind;
use crate::domain::month_service::MonthService;
use crate::storage::{Connection, IncomeQuery, IncomeStorage, LabelStorage};

/// Service for budgeted and received income lines
#[derive(Clone)]
pub struct IncomeService<C: Connection> {
    income_repository: C::IncomeRepository,
    label_repository: C::LabelRepository,
    month_service: MonthService<C>,
}

impl<C: Connection> IncomeService<C> {
    pub fn new(connection: Arc<C>, month_service: MonthService<C>) -> Self {
        Self {
            income_repository: connection.create_income_repository(),
            label_repository: connection.create_label_repository(),
            month_service,
        }
    }

    pub async fn create_income(&self, command: CreateIncomeCommand, user: Option<&str>) -> BudgetResult<Income> {
        info!("Creating income: {:?}", command);
        self.month_service
            .require_open_month(command.month_id, "add income")
            .await?;
        self.require_income_type(command.income_type_id).await?;

        let income = self
            .income_repository
            .insert_income(
                &NewIncome {
                    income_type_id: command.income_type_id,
                    period: command.period,
                    budget: command.budget,
                    amount: command.amount,
                    month_id: command.month_id,
                },
                user,
            )
            .await?;

        info!("Created income with ID {} in month {}", income.id, income.month_id);
        Ok(income)
    }

    pub async fn get_income(&self, income_id: i64) -> BudgetResult<Income> {
        self.income_repository
            .get_income(income_id)
            .await?
            .ok_or_else(|| BudgetError::not_found(format!("Income with ID {} not found", income_id)))
    }

    pub async fn list_incomes(&self, query: IncomeQuery) -> BudgetResult<Vec<Income>> {
        let incomes = self.income_repository.list_incomes(&query).await?;
        info!("Found {} incomes for {:?}", incomes.len(), query);
        Ok(incomes)
    }

    pub async fn update_income(
        &self,
        income_id: i64,
        command: UpdateIncomeCommand,
        user: Option<&str>,
    ) -> BudgetResult<Income> {
        info!("Updating income {}: {:?}", income_id, command);
        let mut income = self.get_income(income_id).await?;

        let target_month = command.month_id.unwrap_or(income.month_id);
        self.month_service
            .require_open_month(target_month, "update income")
            .await?;
        income.month_id = target_month;

        if let Some(income_type_id) = command.income_type_id {
            self.require_income_type(income_type_id).await?;
            income.income_type_id = income_type_id;
        }
        if let Some(period) = command.period {
            income.period = period;
        }
        if let Some(budget) = command.budget {
            income.budget = budget;
        }
        if let Some(amount) = command.amount {
            income.amount = amount;
        }

        let updated = self.income_repository.update_income(&income, user).await?;
        info!("Updated income with ID {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_income(&self, income_id: i64) -> BudgetResult<()> {
        let income = self.get_income(income_id).await?;
        self.month_service
            .require_open_month(income.month_id, "delete income")
            .await?;

        self.income_repository.delete_income(income_id).await?;
        info!("Deleted income with ID {}", income_id);
        Ok(())
    }

    async fn require_income_type(&self, income_type_id: i64) -> BudgetResult<()> {
        match self.label_repository.get_label(LabelKind::IncomeType, income_type_id).await? {
            Some(_) => Ok(()),
            None => Err(BudgetError::validation(format!(
                "Income type with ID {} not found",
                income_type_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::months::CreateMonthCommand;
    use crate::storage::DbConnection;

    struct Fixture {
        service: IncomeService<DbConnection>,
        months: MonthService<DbConnection>,
        month_id: i64,
        salary_id: i64,
    }

    async fn setup_test() -> Fixture {
        let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
        let months = MonthService::new(db.clone());
        let month = months
            .create_month(CreateMonthCommand { year: 2024, month: 8 }, None)
            .await
            .unwrap();
        let salary = db
            .create_label_repository()
            .insert_label(LabelKind::IncomeType, "Salary", "#10b981", None)
            .await
            .unwrap();
        Fixture {
            service: IncomeService::new(db, months.clone()),
            months,
            month_id: month.id,
            salary_id: salary.id,
        }
    }

    fn create(income_type_id: i64, month_id: i64) -> CreateIncomeCommand {
        CreateIncomeCommand {
            income_type_id,
            period: "1st Period".to_string(),
            budget: 2500.0,
            amount: 0.0,
            month_id,
        }
    }

    #[tokio::test]
    async fn test_income_crud() {
        let f = setup_test().await;

        let income = f.service.create_income(create(f.salary_id, f.month_id), Some("alice")).await.unwrap();
        assert_eq!(income.budget, 2500.0);

        let command = UpdateIncomeCommand { amount: Some(2480.0), ..Default::default() };
        let updated = f.service.update_income(income.id, command, Some("bob")).await.unwrap();
        assert_eq!(updated.amount, 2480.0);
        assert_eq!(updated.budget, 2500.0);

        let listed = f
            .service
            .list_incomes(IncomeQuery { month_id: Some(f.month_id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        f.service.delete_income(income.id).await.unwrap();
        let err = f.service.get_income(income.id).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Income with ID {} not found", income.id));
    }

    #[tokio::test]
    async fn test_income_validation() {
        let f = setup_test().await;

        let err = f.service.create_income(create(999, f.month_id), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Income type with ID 999 not found");

        let err = f.service.create_income(create(f.salary_id, 999), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Month with ID 999 not found");

        let income = f.service.create_income(create(f.salary_id, f.month_id), None).await.unwrap();
        let command = UpdateIncomeCommand { income_type_id: Some(555), ..Default::default() };
        let err = f.service.update_income(income.id, command, None).await.unwrap_err();
        assert!(matches!(err, BudgetError::Validation(_)));
    }

    #[tokio::test]
    async fn test_closed_month_blocks_income_changes() {
        let f = setup_test().await;
        let income = f.service.create_income(create(f.salary_id, f.month_id), None).await.unwrap();
        f.months.close_month(f.month_id, None).await.unwrap();

        let err = f.service.create_income(create(f.salary_id, f.month_id), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot add income: Month 'August 2024' is closed");

        let err = f.service.delete_income(income.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete income: Month 'August 2024' is closed");
    }
}
