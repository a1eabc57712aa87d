use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Income {
    pub id: i64,
    pub income_type_id: i64,
    pub period: String,
    pub budget: f64,
    pub amount: f64,
    pub month_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIncome {
    pub income_type_id: i64,
    pub period: String,
    pub budget: f64,
    pub amount: f64,
    pub month_id: i64,
}
