//! Expense service domain logic.
//!
//! ## Business Rules
//!
//! - Expenses belong to an open month; closed months are read-only
//! - When purchases are recorded, cost is the sum of their amounts
//! - New expenses without an explicit order go after the last one in the month
//! - Cloning copies budget lines into the following month with costs reset

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::calendar;
use crate::domain::commands::expenses::{
    CloneMonthResult, CreateExpenseCommand, PayExpenseCommand, ReorderExpensesCommand,
    ReorderExpensesResult, UpdateExpenseCommand,
};
use crate::domain::error::{BudgetError, BudgetResult};
use crate::domain::models::expense::{total_of, Expense, NewExpense, Purchase};
use crate::domain::models::income::NewIncome;
use crate::domain::month_service::MonthService;
use crate::storage::{Connection, ExpenseQuery, ExpenseStorage, IncomeQuery, IncomeStorage};

#[derive(Clone)]
pub struct ExpenseService<C: Connection> {
    expense_repository: C::ExpenseRepository,
    income_repository: C::IncomeRepository,
    month_service: MonthService<C>,
}

impl<C: Connection> ExpenseService<C> {
    pub fn new(connection: Arc<C>, month_service: MonthService<C>) -> Self {
        Self {
            expense_repository: connection.create_expense_repository(),
            income_repository: connection.create_income_repository(),
            month_service,
        }
    }

    pub async fn create_expense(
        &self,
        command: CreateExpenseCommand,
        user: Option<&str>,
    ) -> BudgetResult<Expense> {
        self.create_expense_at(command, user, calendar::today()).await
    }

    pub async fn create_expense_at(
        &self,
        command: CreateExpenseCommand,
        user: Option<&str>,
        today: NaiveDate,
    ) -> BudgetResult<Expense> {
        info!("Creating expense: {:?}", command);

        let expense_name = command.expense_name.trim().to_string();
        if expense_name.is_empty() {
            return Err(BudgetError::validation("Expense name cannot be empty"));
        }
        self.month_service
            .require_open_month(command.month_id, "add expense")
            .await?;

        // A blank date counts as no date
        let expense_date = match non_blank(&command.expense_date) {
            Some(date) => calendar::parse_date("expense_date", date)?,
            None => today,
        };

        // Non-empty purchases decide the cost; otherwise the given cost stands
        let (purchases, cost) = match command.purchases {
            Some(purchases) if !purchases.is_empty() => {
                let cost = total_of(&purchases);
                (Some(purchases), cost)
            }
            _ => (None, command.cost),
        };

        let order = match command.order {
            Some(order) => order,
            None => self
                .expense_repository
                .max_order(command.month_id)
                .await?
                .map_or(0, |max| max + 1),
        };

        let new_expense = NewExpense {
            expense_name,
            period: command.period,
            category: command.category,
            budget: command.budget,
            cost,
            notes: command.notes,
            month_id: command.month_id,
            purchases,
            order,
            expense_date: Some(expense_date),
        };
        let expense = self.expense_repository.insert_expense(&new_expense, user).await?;

        info!("Created expense {} with ID {}", expense.expense_name, expense.id);
        Ok(expense)
    }

    pub async fn get_expense(&self, expense_id: i64) -> BudgetResult<Expense> {
        self.expense_repository
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| BudgetError::not_found("Expense not found"))
    }

    pub async fn list_expenses(&self, query: ExpenseQuery) -> BudgetResult<Vec<Expense>> {
        let expenses = self.expense_repository.list_expenses(&query).await?;
        info!("Found {} expenses for {:?}", expenses.len(), query);
        Ok(expenses)
    }

    pub async fn update_expense(
        &self,
        expense_id: i64,
        command: UpdateExpenseCommand,
        user: Option<&str>,
    ) -> BudgetResult<Expense> {
        info!("Updating expense {}: {:?}", expense_id, command);
        let mut expense = self.get_expense(expense_id).await?;

        let target_month = command.month_id.unwrap_or(expense.month_id);
        self.month_service
            .require_open_month(target_month, "update expense")
            .await?;

        if let Some(name) = command.expense_name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BudgetError::validation("Expense name cannot be empty"));
            }
            expense.expense_name = name;
        }
        if let Some(period) = command.period {
            expense.period = period;
        }
        if let Some(category) = command.category {
            expense.category = category;
        }
        if let Some(budget) = command.budget {
            expense.budget = budget;
        }
        if let Some(cost) = command.cost {
            expense.cost = cost;
        }
        if let Some(notes) = command.notes {
            expense.notes = notes;
        }
        if let Some(order) = command.order {
            expense.order = order;
        }
        if let Some(date) = non_blank(&command.expense_date) {
            expense.expense_date = Some(calendar::parse_date("expense_date", date)?);
        }
        expense.month_id = target_month;

        // Sent purchases replace the list; an empty or null list clears it
        // and leaves the cost as it is
        if let Some(purchases) = command.purchases {
            match purchases {
                Some(purchases) if !purchases.is_empty() => {
                    expense.cost = total_of(&purchases);
                    expense.purchases = Some(purchases);
                }
                _ => expense.purchases = None,
            }
        }

        let updated = self.expense_repository.update_expense(&expense, user).await?;
        info!("Updated expense {} with ID {}", updated.expense_name, updated.id);
        Ok(updated)
    }

    pub async fn delete_expense(&self, expense_id: i64) -> BudgetResult<()> {
        let expense = self.get_expense(expense_id).await?;
        self.month_service
            .require_open_month(expense.month_id, "delete expense")
            .await?;

        self.expense_repository.delete_expense(expense_id).await?;
        info!("Deleted expense {} with ID {}", expense.expense_name, expense_id);
        Ok(())
    }

    /// Give each listed expense its index as position
    pub async fn reorder_expenses(
        &self,
        command: ReorderExpensesCommand,
        user: Option<&str>,
    ) -> BudgetResult<ReorderExpensesResult> {
        info!("Reordering {} expenses", command.expense_ids.len());
        if command.expense_ids.is_empty() {
            return Err(BudgetError::validation("expense_ids cannot be empty"));
        }

        for expense_id in &command.expense_ids {
            if self.expense_repository.get_expense(*expense_id).await?.is_none() {
                return Err(BudgetError::not_found(format!("Expense with ID {} not found", expense_id)));
            }
        }

        self.expense_repository
            .reorder_expenses(&command.expense_ids, user)
            .await?;

        let mut expenses = Vec::with_capacity(command.expense_ids.len());
        for expense_id in &command.expense_ids {
            expenses.push(self.get_expense(*expense_id).await?);
        }
        Ok(ReorderExpensesResult { expenses })
    }

    pub async fn pay_expense(
        &self,
        expense_id: i64,
        command: PayExpenseCommand,
        user: Option<&str>,
    ) -> BudgetResult<Expense> {
        self.pay_expense_at(expense_id, command, user, calendar::today()).await
    }

    /// Record a payment purchase of `amount` (or the full budget)
    pub async fn pay_expense_at(
        &self,
        expense_id: i64,
        command: PayExpenseCommand,
        user: Option<&str>,
        today: NaiveDate,
    ) -> BudgetResult<Expense> {
        let mut expense = self.get_expense(expense_id).await?;
        self.month_service
            .require_open_month(expense.month_id, "pay expense")
            .await?;

        let amount = command.amount.unwrap_or(expense.budget);
        let mut purchases = expense.purchases.take().unwrap_or_default();
        purchases.push(Purchase {
            name: "Payment".to_string(),
            amount,
            date: Some(today),
        });
        expense.cost = total_of(&purchases);
        expense.purchases = Some(purchases);

        let paid = self.expense_repository.update_expense(&expense, user).await?;
        info!("Paid {} toward expense {} (cost now {})", amount, paid.id, paid.cost);
        Ok(paid)
    }

    /// Copy a month's expenses and incomes into the following month.
    ///
    /// The target month is created when missing. Expenses keep their budget,
    /// notes and position with cost and purchases reset; incomes keep their
    /// budget with the amount reset.
    pub async fn clone_to_next_month(
        &self,
        month_id: i64,
        user: Option<&str>,
    ) -> BudgetResult<CloneMonthResult> {
        let source = self.month_service.get_month(month_id).await?;
        let (year, month) = calendar::next_month(source.year, source.month);
        let (target, created) = self.month_service.get_or_create_month(year, month, user).await?;

        if target.is_closed {
            warn!("Refusing to clone {} into closed month {}", source.name, target.name);
            return Err(BudgetError::validation(format!(
                "Cannot clone into closed month '{}'",
                target.name
            )));
        }
        info!(
            "Cloning {} into {} (month {})",
            source.name,
            target.name,
            if created { "created" } else { "existing" }
        );

        let expenses: Vec<NewExpense> = self
            .expense_repository
            .list_expenses(&ExpenseQuery { month_id: Some(source.id), ..Default::default() })
            .await?
            .into_iter()
            .map(|expense| NewExpense {
                expense_name: expense.expense_name,
                period: expense.period,
                category: expense.category,
                budget: expense.budget,
                cost: 0.0,
                notes: expense.notes,
                month_id: target.id,
                purchases: None,
                order: expense.order,
                expense_date: Some(target.start_date),
            })
            .collect();

        let incomes: Vec<NewIncome> = self
            .income_repository
            .list_incomes(&IncomeQuery { month_id: Some(source.id), ..Default::default() })
            .await?
            .into_iter()
            .map(|income| NewIncome {
                income_type_id: income.income_type_id,
                period: income.period,
                budget: income.budget,
                amount: 0.0,
                month_id: target.id,
            })
            .collect();

        let (cloned_count, cloned_income_count) = self
            .expense_repository
            .insert_batch(&expenses, &incomes, user)
            .await?;

        let message = clone_message(cloned_count, cloned_income_count, &target.name);
        info!("{}", message);
        Ok(CloneMonthResult {
            message,
            cloned_count,
            cloned_income_count,
            next_month: target,
        })
    }
}

fn clone_message(expenses: u64, incomes: u64, month_name: &str) -> String {
    let mut parts = Vec::new();
    if expenses > 0 {
        parts.push(format!("{} expense(s)", expenses));
    }
    if incomes > 0 {
        parts.push(format!("{} income(s)", incomes));
    }

    if parts.is_empty() {
        format!("No data to clone for {}", month_name)
    } else {
        format!("Successfully cloned {} to {}", parts.join(", "), month_name)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
