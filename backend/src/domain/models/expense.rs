use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An itemized payment; stored as JSON inside the expense row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub expense_name: String,
    pub period: String,
    pub category: String,
    pub budget: f64,
    pub cost: f64,
    pub notes: Option<String>,
    pub month_id: i64,
    pub purchases: Option<Vec<Purchase>>,
    pub order: i64,
    pub expense_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl Expense {
    /// Sum of all purchase amounts, if any purchases are recorded
    pub fn purchases_total(&self) -> Option<f64> {
        self.purchases.as_deref().map(total_of)
    }
}

/// Fields needed to insert an expense
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub expense_name: String,
    pub period: String,
    pub category: String,
    pub budget: f64,
    pub cost: f64,
    pub notes: Option<String>,
    pub month_id: i64,
    pub purchases: Option<Vec<Purchase>>,
    pub order: i64,
    pub expense_date: Option<NaiveDate>,
}

/// Sum the amounts of a purchase list
pub fn total_of(purchases: &[Purchase]) -> f64 {
    purchases.iter().map(|p| p.amount).sum()
}
