use chrono::{DateTime, NaiveDate, Utc};

/// A budgeting month as stored by the domain
#[derive(Debug, Clone, PartialEq)]
pub struct Month {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_closed: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

/// Fields needed to insert a month; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewMonth {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
