use shared::{
    CreateMonthRequest, Month as SharedMonth, MonthCloseResponse, UpdateMonthRequest,
};

use crate::domain::commands::months::{CreateMonthCommand, MonthStatusResult, UpdateMonthCommand};
use crate::domain::models::month::Month as DomainMonth;

/// Mapper between shared month DTOs and domain months
pub struct MonthMapper;

impl MonthMapper {
    pub fn to_dto(domain: DomainMonth) -> SharedMonth {
        SharedMonth {
            id: domain.id,
            year: domain.year,
            month: domain.month,
            name: domain.name,
            start_date: domain.start_date.format("%Y-%m-%d").to_string(),
            end_date: domain.end_date.format("%Y-%m-%d").to_string(),
            is_closed: domain.is_closed,
            closed_at: domain.closed_at.map(|t| t.to_rfc3339()),
            closed_by: domain.closed_by,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
            created_by: domain.created_by,
            updated_by: domain.updated_by,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainMonth>) -> Vec<SharedMonth> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_status_dto(result: MonthStatusResult) -> MonthCloseResponse {
        MonthCloseResponse {
            id: result.month.id,
            name: result.month.name,
            is_closed: result.month.is_closed,
            closed_at: result.month.closed_at.map(|t| t.to_rfc3339()),
            closed_by: result.month.closed_by,
            message: result.message,
        }
    }

    pub fn to_create_command(request: CreateMonthRequest) -> CreateMonthCommand {
        CreateMonthCommand {
            year: request.year,
            month: request.month,
        }
    }

    pub fn to_update_command(request: UpdateMonthRequest) -> UpdateMonthCommand {
        UpdateMonthCommand {
            year: request.year,
            month: request.month,
            name: request.name,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}
