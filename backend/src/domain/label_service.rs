//! Categories, periods and income types.
//!
//! All three are named, colored labels with the same rules, so one service type
//! is instantiated per [`LabelKind`].
//!
//! ## Business Rules
//!
//! - Names are trimmed, non-empty and unique within a kind; a duplicate name
//!   is reported as a validation failure
//! - Colors are `#rrggbb`; each kind has its own default
//! - Renames are carried over to the expenses and incomes that use the label
//! - A label still in use cannot be deleted

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::labels::LabelCommand;
use crate::domain::error::{BudgetError, BudgetResult};
use crate::domain::models::label::{Label, LabelKind, LabelUsage};
use crate::storage::{Connection, LabelStorage};

#[derive(Clone)]
pub struct LabelService<C: Connection> {
    kind: LabelKind,
    label_repository: C::LabelRepository,
}

impl<C: Connection> LabelService<C> {
    pub fn new(connection: Arc<C>, kind: LabelKind) -> Self {
        Self {
            kind,
            label_repository: connection.create_label_repository(),
        }
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    pub async fn list_labels(&self) -> BudgetResult<Vec<Label>> {
        Ok(self.label_repository.list_labels(self.kind).await?)
    }

    pub async fn get_label(&self, label_id: i64) -> BudgetResult<Label> {
        self.label_repository
            .get_label(self.kind, label_id)
            .await?
            .ok_or_else(|| BudgetError::not_found(format!("{} not found", self.kind.title())))
    }

    pub async fn create_label(&self, command: LabelCommand, user: Option<&str>) -> BudgetResult<Label> {
        info!("Creating {}: {:?}", self.kind, command);
        let name = self.validate_name(&command.name)?;
        let color = match &command.color {
            Some(color) => validate_color(color)?,
            None => self.kind.default_color().to_string(),
        };

        if self.label_repository.get_label_by_name(self.kind, &name).await?.is_some() {
            return Err(BudgetError::validation(format!("{} already exists", self.kind.title())));
        }

        let label = self
            .label_repository
            .insert_label(self.kind, &name, &color, user)
            .await?;
        info!("Created {} {} with ID {}", self.kind, label.name, label.id);
        Ok(label)
    }

    /// Rename and/or recolor a label. A missing color keeps the current one.
    pub async fn update_label(
        &self,
        label_id: i64,
        command: LabelCommand,
        user: Option<&str>,
    ) -> BudgetResult<Label> {
        info!("Updating {} {}: {:?}", self.kind, label_id, command);
        let existing = self.get_label(label_id).await?;
        let name = self.validate_name(&command.name)?;
        let color = match &command.color {
            Some(color) => validate_color(color)?,
            None => existing.color.clone(),
        };

        if let Some(other) = self.label_repository.get_label_by_name(self.kind, &name).await? {
            if other.id != label_id {
                return Err(BudgetError::validation(format!("{} name already exists", self.kind.title())));
            }
        }

        let updated = self
            .label_repository
            .update_label(&existing, &name, &color, user)
            .await?;
        if existing.name != updated.name {
            info!("Renamed {} '{}' to '{}'", self.kind, existing.name, updated.name);
        }
        Ok(updated)
    }

    pub async fn delete_label(&self, label_id: i64) -> BudgetResult<()> {
        let label = self.get_label(label_id).await?;

        let usage = self.label_repository.label_usage(&label).await?;
        if !usage.is_unused() {
            warn!("Refusing to delete {} '{}': {:?}", self.kind, label.name, usage);
            return Err(in_use_error(self.kind, usage));
        }

        self.label_repository.delete_label(self.kind, label_id).await?;
        info!("Deleted {} {} with ID {}", self.kind, label.name, label_id);
        Ok(())
    }

    /// Message returned after a successful delete
    pub fn deleted_message(&self) -> String {
        format!("{} deleted successfully", self.kind.title())
    }

    fn validate_name(&self, name: &str) -> BudgetResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BudgetError::validation(format!("{} name cannot be empty", self.kind.title())));
        }
        Ok(name.to_string())
    }
}

/// Accept `#rrggbb` and normalize to lowercase
pub fn validate_color(color: &str) -> BudgetResult<String> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(color.to_ascii_lowercase())
    } else {
        Err(BudgetError::validation(format!(
            "Invalid color '{}': expected a hex value like #8b5cf6",
            color
        )))
    }
}

fn in_use_error(kind: LabelKind, usage: LabelUsage) -> BudgetError {
    let mut parts = Vec::new();
    if usage.expenses > 0 {
        parts.push(format!("{} expense(s)", usage.expenses));
    }
    if usage.incomes > 0 {
        parts.push(format!("{} income(s)", usage.incomes));
    }

    BudgetError::InUse {
        message: format!("Cannot delete {}: it is used by {}", kind, parts.join(" and ")),
        count: usage.expenses + usage.incomes,
    }
}
