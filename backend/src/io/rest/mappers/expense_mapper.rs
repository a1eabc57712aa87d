use shared::{
    CloneMonthResponse, CreateExpenseRequest, Expense as SharedExpense, ExpenseFilters,
    Purchase as SharedPurchase, UpdateExpenseRequest,
};

use crate::domain::calendar;
use crate::domain::commands::expenses::{CloneMonthResult, CreateExpenseCommand, UpdateExpenseCommand};
use crate::domain::error::BudgetResult;
use crate::domain::models::expense::{Expense as DomainExpense, Purchase as DomainPurchase};
use crate::storage::ExpenseQuery;

/// Mapper between shared expense DTOs and domain expenses
pub struct ExpenseMapper;

impl ExpenseMapper {
    pub fn to_dto(domain: DomainExpense) -> SharedExpense {
        SharedExpense {
            id: domain.id,
            expense_name: domain.expense_name,
            period: domain.period,
            category: domain.category,
            budget: domain.budget,
            cost: domain.cost,
            notes: domain.notes,
            month_id: domain.month_id,
            purchases: domain
                .purchases
                .map(|list| list.into_iter().map(Self::purchase_to_dto).collect()),
            order: domain.order,
            expense_date: domain.expense_date.map(|d| d.format("%Y-%m-%d").to_string()),
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
            created_by: domain.created_by,
            updated_by: domain.updated_by,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainExpense>) -> Vec<SharedExpense> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn purchase_to_dto(domain: DomainPurchase) -> SharedPurchase {
        SharedPurchase {
            name: domain.name,
            amount: domain.amount,
            date: domain.date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Purchase dates must be ISO dates when present
    pub fn purchase_to_domain(dto: SharedPurchase) -> BudgetResult<DomainPurchase> {
        let date = match dto.date.as_deref() {
            Some(date) if !date.is_empty() => Some(calendar::parse_date("purchase date", date)?),
            _ => None,
        };
        Ok(DomainPurchase {
            name: dto.name,
            amount: dto.amount,
            date,
        })
    }

    fn purchases_to_domain(dtos: Vec<SharedPurchase>) -> BudgetResult<Vec<DomainPurchase>> {
        dtos.into_iter().map(Self::purchase_to_domain).collect()
    }

    pub fn to_create_command(request: CreateExpenseRequest) -> BudgetResult<CreateExpenseCommand> {
        Ok(CreateExpenseCommand {
            expense_name: request.expense_name,
            period: request.period,
            category: request.category,
            budget: request.budget,
            cost: request.cost,
            notes: request.notes,
            month_id: request.month_id,
            purchases: request.purchases.map(Self::purchases_to_domain).transpose()?,
            order: request.order,
            expense_date: request.expense_date,
        })
    }

    pub fn to_update_command(request: UpdateExpenseRequest) -> BudgetResult<UpdateExpenseCommand> {
        let purchases = match request.purchases {
            Some(Some(list)) => Some(Some(Self::purchases_to_domain(list)?)),
            Some(None) => Some(None),
            None => None,
        };

        Ok(UpdateExpenseCommand {
            expense_name: request.expense_name,
            period: request.period,
            category: request.category,
            budget: request.budget,
            cost: request.cost,
            notes: request.notes,
            month_id: request.month_id,
            purchases,
            order: request.order,
            expense_date: request.expense_date,
        })
    }

    pub fn to_query(filters: ExpenseFilters) -> ExpenseQuery {
        ExpenseQuery {
            period: filters.period,
            category: filters.category,
            month_id: filters.month_id,
        }
    }

    pub fn to_clone_dto(result: CloneMonthResult) -> CloneMonthResponse {
        CloneMonthResponse {
            message: result.message,
            cloned_count: result.cloned_count,
            cloned_income_count: result.cloned_income_count,
            next_month_id: result.next_month.id,
            next_month_name: result.next_month.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn purchase(date: Option<&str>) -> SharedPurchase {
        SharedPurchase {
            name: "Market".to_string(),
            amount: 12.5,
            date: date.map(str::to_string),
        }
    }

    #[test]
    fn test_purchase_dates() {
        let parsed = ExpenseMapper::purchase_to_domain(purchase(Some("2024-11-03"))).unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2024, 11, 3));

        assert!(ExpenseMapper::purchase_to_domain(purchase(None)).unwrap().date.is_none());
        assert!(ExpenseMapper::purchase_to_domain(purchase(Some(""))).unwrap().date.is_none());
        assert!(ExpenseMapper::purchase_to_domain(purchase(Some("yesterday"))).is_err());

        let back = ExpenseMapper::purchase_to_dto(parsed);
        assert_eq!(back.date.as_deref(), Some("2024-11-03"));
    }

    #[test]
    fn test_update_command_keeps_null_distinction() {
        let request: UpdateExpenseRequest = serde_json::from_str(r#"{"purchases": null}"#).unwrap();
        let command = ExpenseMapper::to_update_command(request).unwrap();
        assert!(matches!(command.purchases, Some(None)));
        assert!(command.notes.is_none());

        let request: UpdateExpenseRequest =
            serde_json::from_str(r#"{"purchases": [{"name": "A", "amount": 1.0}]}"#).unwrap();
        let command = ExpenseMapper::to_update_command(request).unwrap();
        assert_eq!(command.purchases.unwrap().unwrap().len(), 1);
    }
}
