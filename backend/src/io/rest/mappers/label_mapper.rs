use shared::{Label as SharedLabel, LabelRequest};

use crate::domain::commands::labels::LabelCommand;
use crate::domain::models::label::Label as DomainLabel;

/// Mapper for categories, periods and income types
pub struct LabelMapper;

impl LabelMapper {
    pub fn to_dto(domain: DomainLabel) -> SharedLabel {
        SharedLabel {
            id: domain.id,
            name: domain.name,
            color: domain.color,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
            created_by: domain.created_by,
            updated_by: domain.updated_by,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainLabel>) -> Vec<SharedLabel> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_command(request: LabelRequest) -> LabelCommand {
        LabelCommand {
            name: request.name,
            color: request.color,
        }
    }
}
