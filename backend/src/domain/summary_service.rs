//! Totals, period rollups, category and income type summaries, and monthly
//! trends.
//!
//! The aggregation itself is done by plain functions over loaded rows so it can
//! be tested without a database; the service only gathers the inputs.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use shared::{
    CategorySummary, CategoryTrendItem, IncomeTypeSummary, MonthlyTrendData, MonthlyTrendsResponse,
    PeriodSummary, PeriodSummaryResponse, SummaryTotals,
};

use crate::domain::error::{BudgetError, BudgetResult};
use crate::domain::models::{
    expense::Expense,
    income::Income,
    label::{Label, LabelKind},
    month::Month,
};
use crate::storage::{
    Connection, ExpenseQuery, ExpenseStorage, IncomeQuery, IncomeStorage, LabelStorage, MonthStorage,
};

pub const DEFAULT_TREND_MONTHS: u32 = 12;
pub const MAX_TREND_MONTHS: u32 = 24;

/// Color used for categories that no longer exist as labels
const FALLBACK_CATEGORY_COLOR: &str = "#8b5cf6";

#[derive(Clone)]
pub struct SummaryService<C: Connection> {
    expense_repository: C::ExpenseRepository,
    income_repository: C::IncomeRepository,
    label_repository: C::LabelRepository,
    month_repository: C::MonthRepository,
}

impl<C: Connection> SummaryService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            expense_repository: connection.create_expense_repository(),
            income_repository: connection.create_income_repository(),
            label_repository: connection.create_label_repository(),
            month_repository: connection.create_month_repository(),
        }
    }

    pub async fn totals(&self, period: Option<String>, month_id: Option<i64>) -> BudgetResult<SummaryTotals> {
        let expenses = self
            .expense_repository
            .list_expenses(&ExpenseQuery { period: period.clone(), category: None, month_id })
            .await?;
        let incomes = self
            .income_repository
            .list_incomes(&IncomeQuery { period, income_type_id: None, month_id })
            .await?;

        Ok(summarize_totals(&expenses, &incomes))
    }

    pub async fn by_period(&self, month_id: Option<i64>) -> BudgetResult<PeriodSummaryResponse> {
        let periods = self.label_repository.list_labels(LabelKind::Period).await?;
        let expenses = self
            .expense_repository
            .list_expenses(&ExpenseQuery { month_id, ..Default::default() })
            .await?;
        let incomes = self
            .income_repository
            .list_incomes(&IncomeQuery { month_id, ..Default::default() })
            .await?;

        Ok(summarize_by_period(&periods, &expenses, &incomes))
    }

    pub async fn category_summary(&self, month_id: Option<i64>) -> BudgetResult<Vec<CategorySummary>> {
        let expenses = self
            .expense_repository
            .list_expenses(&ExpenseQuery { month_id, ..Default::default() })
            .await?;

        Ok(summarize_categories(&expenses))
    }

    pub async fn income_type_summary(
        &self,
        period: Option<String>,
        month_id: Option<i64>,
    ) -> BudgetResult<Vec<IncomeTypeSummary>> {
        let incomes = self
            .income_repository
            .list_incomes(&IncomeQuery { period, income_type_id: None, month_id })
            .await?;
        let income_types = self.label_repository.list_labels(LabelKind::IncomeType).await?;

        Ok(summarize_income_types(&incomes, &income_types))
    }

    /// Trends over the most recent `num_months` months, oldest first
    pub async fn monthly_trends(&self, num_months: Option<u32>) -> BudgetResult<MonthlyTrendsResponse> {
        let num_months = num_months.unwrap_or(DEFAULT_TREND_MONTHS);
        if !(1..=MAX_TREND_MONTHS).contains(&num_months) {
            return Err(BudgetError::validation(format!(
                "num_months must be between 1 and {}",
                MAX_TREND_MONTHS
            )));
        }

        let mut selected: Vec<Month> = self
            .month_repository
            .list_months()
            .await?
            .into_iter()
            .take(num_months as usize)
            .collect();
        selected.reverse();

        let categories = self.label_repository.list_labels(LabelKind::Category).await?;
        let mut months = Vec::with_capacity(selected.len());
        for month in selected {
            let expenses = self
                .expense_repository
                .list_expenses(&ExpenseQuery { month_id: Some(month.id), ..Default::default() })
                .await?;
            let incomes = self
                .income_repository
                .list_incomes(&IncomeQuery { month_id: Some(month.id), ..Default::default() })
                .await?;
            months.push(month_trend(&month, &expenses, &incomes, &categories));
        }

        info!("Computed trends for {} months", months.len());
        Ok(trends_response(months))
    }
}

/// Budgeted and current totals over the given rows
pub fn summarize_totals(expenses: &[Expense], incomes: &[Income]) -> SummaryTotals {
    let total_budgeted_expenses: f64 = expenses.iter().map(|e| e.budget).sum();
    let total_current_expenses: f64 = expenses.iter().map(|e| e.cost).sum();
    let total_budgeted_income: f64 = incomes.iter().map(|i| i.budget).sum();
    let total_current_income: f64 = incomes.iter().map(|i| i.amount).sum();

    SummaryTotals {
        total_budgeted_expenses,
        total_current_expenses,
        total_budgeted_income,
        total_current_income,
        total_budgeted: total_budgeted_income - total_budgeted_expenses,
        total_current: total_current_income - total_current_expenses,
    }
}

/// One row per defined period, in the order given
pub fn summarize_by_period(periods: &[Label], expenses: &[Expense], incomes: &[Income]) -> PeriodSummaryResponse {
    let mut grand_total_income = 0.0;
    let mut grand_total_expenses = 0.0;

    let periods: Vec<PeriodSummary> = periods
        .iter()
        .map(|period| {
            let total_income: f64 = incomes
                .iter()
                .filter(|i| i.period == period.name)
                .map(|i| i.amount)
                .sum();
            let total_expenses: f64 = expenses
                .iter()
                .filter(|e| e.period == period.name)
                .map(|e| e.cost)
                .sum();
            grand_total_income += total_income;
            grand_total_expenses += total_expenses;

            PeriodSummary {
                period: period.name.clone(),
                color: period.color.clone(),
                total_income,
                total_expenses,
                difference: total_income - total_expenses,
            }
        })
        .collect();

    PeriodSummaryResponse {
        periods,
        grand_total_income,
        grand_total_expenses,
        grand_total_difference: grand_total_income - grand_total_expenses,
    }
}

/// Budget vs. spend per category name, sorted by name
pub fn summarize_categories(expenses: &[Expense]) -> Vec<CategorySummary> {
    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();
    for expense in expenses {
        let entry = totals.entry(expense.category.as_str()).or_insert((0.0, 0.0));
        entry.0 += expense.budget;
        entry.1 += expense.cost;
    }

    let mut summaries: Vec<CategorySummary> = totals
        .into_iter()
        .map(|(category, (budget, total))| CategorySummary {
            category: category.to_string(),
            budget,
            total,
            over_budget: total > budget,
        })
        .collect();
    summaries.sort_by(|a, b| a.category.cmp(&b.category));
    summaries
}

/// Budget vs. received per income type name, sorted by name.
/// Incomes whose type no longer exists are grouped as "Unknown".
pub fn summarize_income_types(incomes: &[Income], income_types: &[Label]) -> Vec<IncomeTypeSummary> {
    let names: HashMap<i64, &str> = income_types.iter().map(|t| (t.id, t.name.as_str())).collect();

    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();
    for income in incomes {
        let name = names.get(&income.income_type_id).copied().unwrap_or("Unknown");
        let entry = totals.entry(name).or_insert((0.0, 0.0));
        entry.0 += income.budget;
        entry.1 += income.amount;
    }

    let mut summaries: Vec<IncomeTypeSummary> = totals
        .into_iter()
        .map(|(income_type, (budget, total))| IncomeTypeSummary {
            income_type: income_type.to_string(),
            budget,
            total,
        })
        .collect();
    summaries.sort_by(|a, b| a.income_type.cmp(&b.income_type));
    summaries
}

/// Income, spend and per-category breakdown for one month
pub fn month_trend(month: &Month, expenses: &[Expense], incomes: &[Income], categories: &[Label]) -> MonthlyTrendData {
    let total_income: f64 = incomes.iter().map(|i| i.amount).sum();
    let total_expenses: f64 = expenses.iter().map(|e| e.cost).sum();
    let net_savings = total_income - total_expenses;

    // Categories keep the order in which they first appear
    let mut spend: Vec<(&str, f64)> = Vec::new();
    for expense in expenses {
        match spend.iter_mut().find(|(name, _)| *name == expense.category) {
            Some((_, amount)) => *amount += expense.cost,
            None => spend.push((expense.category.as_str(), expense.cost)),
        }
    }
    let colors: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.name.as_str(), c.color.as_str()))
        .collect();

    MonthlyTrendData {
        month_id: month.id,
        month_name: month.name.clone(),
        year: month.year,
        month: month.month,
        total_income,
        total_expenses,
        net_savings,
        savings_rate: round_to(savings_rate(total_income, net_savings), 1),
        categories: spend
            .into_iter()
            .map(|(category, amount)| CategoryTrendItem {
                category: category.to_string(),
                amount,
                color: colors
                    .get(category)
                    .copied()
                    .unwrap_or(FALLBACK_CATEGORY_COLOR)
                    .to_string(),
            })
            .collect(),
    }
}

/// Averages over the selected months.
///
/// Income and expenses are averaged over every month; the savings rate only
/// over months that had income.
pub fn trends_response(months: Vec<MonthlyTrendData>) -> MonthlyTrendsResponse {
    let count = months.len().max(1) as f64;
    let total_income: f64 = months.iter().map(|m| m.total_income).sum();
    let total_expenses: f64 = months.iter().map(|m| m.total_expenses).sum();

    let rates: Vec<f64> = months
        .iter()
        .filter(|m| m.total_income > 0.0)
        .map(|m| savings_rate(m.total_income, m.net_savings))
        .collect();
    let average_savings_rate = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    MonthlyTrendsResponse {
        months,
        average_income: round_to(total_income / count, 2),
        average_expenses: round_to(total_expenses / count, 2),
        average_savings_rate: round_to(average_savings_rate, 1),
    }
}

fn savings_rate(income: f64, net_savings: f64) -> f64 {
    if income > 0.0 {
        net_savings / income * 100.0
    } else {
        0.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn expense(category: &str, period: &str, budget: f64, cost: f64) -> Expense {
        Expense {
            id: 0,
            expense_name: format!("{} item", category),
            period: period.to_string(),
            category: category.to_string(),
            budget,
            cost,
            notes: None,
            month_id: 1,
            purchases: None,
            order: 0,
            expense_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
        }
    }

    fn income(income_type_id: i64, period: &str, budget: f64, amount: f64) -> Income {
        Income {
            id: 0,
            income_type_id,
            period: period.to_string(),
            budget,
            amount,
            month_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
        }
    }

    fn label(id: i64, kind: LabelKind, name: &str, color: &str) -> Label {
        Label {
            id,
            kind,
            name: name.to_string(),
            color: color.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
        }
    }

    fn month(id: i64, year: i32, number: u32) -> Month {
        Month {
            id,
            year,
            month: number,
            name: format!("{}-{}", year, number),
            start_date: NaiveDate::from_ymd_opt(year, number, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(year, number, 28).unwrap(),
            is_closed: false,
            closed_at: None,
            closed_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
        }
    }

    #[test]
    fn test_summarize_totals() {
        let expenses = vec![
            expense("Groceries", "1st Period", 300.0, 250.0),
            expense("Rent", "1st Period", 1000.0, 1000.0),
        ];
        let incomes = vec![income(1, "1st Period", 2000.0, 1800.0)];

        let totals = summarize_totals(&expenses, &incomes);
        assert_eq!(totals.total_budgeted_expenses, 1300.0);
        assert_eq!(totals.total_current_expenses, 1250.0);
        assert_eq!(totals.total_budgeted_income, 2000.0);
        assert_eq!(totals.total_current_income, 1800.0);
        assert_eq!(totals.total_budgeted, 700.0);
        assert_eq!(totals.total_current, 550.0);

        assert_eq!(summarize_totals(&[], &[]), SummaryTotals::default());
    }

    #[test]
    fn test_summarize_by_period_follows_period_list() {
        let periods = vec![
            label(1, LabelKind::Period, "1st Period", "#111111"),
            label(2, LabelKind::Period, "2nd Period", "#222222"),
        ];
        let expenses = vec![
            expense("Rent", "1st Period", 0.0, 900.0),
            expense("Food", "2nd Period", 0.0, 120.0),
            expense("Misc", "On Demand", 0.0, 50.0),
        ];
        let incomes = vec![income(1, "1st Period", 0.0, 1500.0)];

        let summary = summarize_by_period(&periods, &expenses, &incomes);
        assert_eq!(summary.periods.len(), 2);
        assert_eq!(summary.periods[0].period, "1st Period");
        assert_eq!(summary.periods[0].color, "#111111");
        assert_eq!(summary.periods[0].difference, 600.0);
        assert_eq!(summary.periods[1].difference, -120.0);
        assert_eq!(summary.grand_total_income, 1500.0);
        assert_eq!(summary.grand_total_expenses, 1020.0);
        assert_eq!(summary.grand_total_difference, 480.0);
    }

    #[test]
    fn test_summarize_categories_flags_over_budget() {
        let expenses = vec![
            expense("Transportation", "1st Period", 100.0, 60.0),
            expense("Groceries", "1st Period", 200.0, 150.0),
            expense("Groceries", "2nd Period", 100.0, 180.0),
        ];

        let summary = summarize_categories(&expenses);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].category, "Groceries");
        assert_eq!(summary[0].budget, 300.0);
        assert_eq!(summary[0].total, 330.0);
        assert!(summary[0].over_budget);
        assert_eq!(summary[1].category, "Transportation");
        assert!(!summary[1].over_budget);
    }

    #[test]
    fn test_summarize_income_types_reports_unknown() {
        let types = vec![
            label(1, LabelKind::IncomeType, "Salary", "#10b981"),
            label(2, LabelKind::IncomeType, "Bonus", "#10b981"),
        ];
        let incomes = vec![
            income(1, "1st Period", 2000.0, 2000.0),
            income(1, "2nd Period", 2000.0, 1900.0),
            income(2, "1st Period", 300.0, 0.0),
            income(99, "1st Period", 10.0, 10.0),
        ];

        let summary = summarize_income_types(&incomes, &types);
        let names: Vec<&str> = summary.iter().map(|s| s.income_type.as_str()).collect();
        assert_eq!(names, vec!["Bonus", "Salary", "Unknown"]);
        assert_eq!(summary[1].budget, 4000.0);
        assert_eq!(summary[1].total, 3900.0);
    }

    #[test]
    fn test_month_trend() {
        let categories = vec![label(1, LabelKind::Category, "Rent", "#aa0000")];
        let expenses = vec![
            expense("Rent", "1st Period", 0.0, 1000.0),
            expense("Gone", "1st Period", 0.0, 200.0),
            expense("Rent", "2nd Period", 0.0, 100.0),
        ];
        let incomes = vec![income(1, "1st Period", 0.0, 3000.0)];

        let trend = month_trend(&month(7, 2024, 3), &expenses, &incomes, &categories);
        assert_eq!(trend.total_expenses, 1300.0);
        assert_eq!(trend.net_savings, 1700.0);
        assert_eq!(trend.savings_rate, 56.7);
        assert_eq!(trend.categories.len(), 2);
        assert_eq!(trend.categories[0].category, "Rent");
        assert_eq!(trend.categories[0].amount, 1100.0);
        assert_eq!(trend.categories[0].color, "#aa0000");
        assert_eq!(trend.categories[1].color, FALLBACK_CATEGORY_COLOR);

        let no_income = month_trend(&month(8, 2024, 4), &expenses, &[], &categories);
        assert_eq!(no_income.savings_rate, 0.0);
    }

    #[test]
    fn test_trends_averages() {
        let with_income = month_trend(&month(1, 2024, 1), &[expense("A", "p", 0.0, 500.0)], &[income(1, "p", 0.0, 1000.0)], &[]);
        let without_income = month_trend(&month(2, 2024, 2), &[expense("A", "p", 0.0, 100.0)], &[], &[]);

        let response = trends_response(vec![with_income, without_income]);
        assert_eq!(response.average_income, 500.0);
        assert_eq!(response.average_expenses, 300.0);
        // Only the month with income counts toward the savings rate
        assert_eq!(response.average_savings_rate, 50.0);

        let empty = trends_response(vec![]);
        assert_eq!(empty.average_income, 0.0);
        assert_eq!(empty.average_savings_rate, 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(56.6666, 1), 56.7);
        assert_eq!(round_to(333.3333, 2), 333.33);
    }
}
