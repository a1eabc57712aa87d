//! Idempotent seeding of default labels and the current month.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use crate::domain::calendar;
use crate::domain::error::BudgetResult;
use crate::domain::models::label::LabelKind;
use crate::domain::month_service::MonthService;
use crate::storage::{Connection, LabelStorage, SeedStorage};

const SEED_USER: &str = "system";

pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "Groceries",
    "Transportation",
    "Insurance",
    "Subscriptions",
    "Rent/Utilities",
    "Going Out",
    "Purchases",
    "Health",
    "Investment/Savings",
    "Withdraw",
];

pub const DEFAULT_INCOME_TYPES: [&str; 6] = [
    "Salary",
    "Carry Over",
    "Side Hustle",
    "Tax Return",
    "Investment Return",
    "Bonus",
];

pub const DEFAULT_PERIODS: [&str; 3] = ["On Demand", "1st Period", "2nd Period"];

/// What a seeding run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub labels_created: usize,
    pub labels_skipped: usize,
    pub sets_already_applied: usize,
    pub month_created: bool,
}

#[derive(Clone)]
pub struct SeedService<C: Connection> {
    label_repository: C::LabelRepository,
    seed_repository: C::SeedRepository,
    month_service: MonthService<C>,
}

impl<C: Connection> SeedService<C> {
    pub fn new(connection: Arc<C>, month_service: MonthService<C>) -> Self {
        Self {
            label_repository: connection.create_label_repository(),
            seed_repository: connection.create_seed_repository(),
            month_service,
        }
    }

    pub async fn seed_all(&self) -> BudgetResult<SeedReport> {
        self.seed_all_at(calendar::today()).await
    }

    pub async fn seed_all_at(&self, today: NaiveDate) -> BudgetResult<SeedReport> {
        let mut report = SeedReport::default();

        for (seed_id, kind, names) in [
            ("default_categories", LabelKind::Category, &DEFAULT_CATEGORIES[..]),
            ("default_income_types", LabelKind::IncomeType, &DEFAULT_INCOME_TYPES[..]),
            ("default_periods", LabelKind::Period, &DEFAULT_PERIODS[..]),
        ] {
            if self.seed_repository.seed_executed(seed_id).await? {
                info!("Seed {} already applied, skipping", seed_id);
                report.sets_already_applied += 1;
                continue;
            }

            for name in names {
                if self.label_repository.get_label_by_name(kind, name).await?.is_some() {
                    report.labels_skipped += 1;
                    continue;
                }
                self.label_repository
                    .insert_label(kind, name, &seed_color(name), Some(SEED_USER))
                    .await?;
                report.labels_created += 1;
            }

            self.seed_repository.record_seed(seed_id).await?;
            info!("Applied seed {}", seed_id);
        }

        let (year, month) = calendar::year_month_of(today);
        let (current, created) = self
            .month_service
            .get_or_create_month(year, month, Some(SEED_USER))
            .await?;
        report.month_created = created;
        info!(
            "Current month {} {}",
            current.name,
            if created { "created" } else { "already exists" }
        );

        Ok(report)
    }
}

/// Stable color for a seeded label; each channel stays within 50..=255 so
/// labels are never too dark to read
pub fn seed_color(name: &str) -> String {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }

    let channel = |shift: u32| 50 + ((hash >> shift) & 0xff) % 206;
    format!("#{:02x}{:02x}{:02x}", channel(0), channel(8), channel(16))
}
