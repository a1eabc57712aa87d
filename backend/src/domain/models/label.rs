use chrono::{DateTime, Utc};
use std::fmt;

/// The three kinds of user-defined labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Category,
    Period,
    IncomeType,
}

impl LabelKind {
    pub const ALL: [LabelKind; 3] = [LabelKind::Category, LabelKind::Period, LabelKind::IncomeType];

    /// Backing table
    pub fn table(self) -> &'static str {
        match self {
            LabelKind::Category => "categories",
            LabelKind::Period => "periods",
            LabelKind::IncomeType => "income_types",
        }
    }

    /// Capitalized name used at the start of messages
    pub fn title(self) -> &'static str {
        match self {
            LabelKind::Category => "Category",
            LabelKind::Period => "Period",
            LabelKind::IncomeType => "Income type",
        }
    }

    pub fn default_color(self) -> &'static str {
        match self {
            LabelKind::Category | LabelKind::Period => "#8b5cf6",
            LabelKind::IncomeType => "#10b981",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelKind::Category => "category",
            LabelKind::Period => "period",
            LabelKind::IncomeType => "income type",
        };
        f.write_str(name)
    }
}

/// A category, period or income type
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: i64,
    pub kind: LabelKind,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

/// How many expenses and incomes still reference a label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelUsage {
    pub expenses: i64,
    pub incomes: i64,
}

impl LabelUsage {
    pub fn is_unused(&self) -> bool {
        self.expenses == 0 && self.incomes == 0
    }
}
