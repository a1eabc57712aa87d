use shared::{CreateIncomeRequest, Income as SharedIncome, IncomeFilters, UpdateIncomeRequest};

use crate::domain::commands::incomes::{CreateIncomeCommand, UpdateIncomeCommand};
use crate::domain::models::income::Income as DomainIncome;
use crate::storage::IncomeQuery;

/// Mapper between shared income DTOs and domain incomes
pub struct IncomeMapper;

impl IncomeMapper {
    pub fn to_dto(domain: DomainIncome) -> SharedIncome {
        SharedIncome {
            id: domain.id,
            income_type_id: domain.income_type_id,
            period: domain.period,
            budget: domain.budget,
            amount: domain.amount,
            month_id: domain.month_id,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
            created_by: domain.created_by,
            updated_by: domain.updated_by,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainIncome>) -> Vec<SharedIncome> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_create_command(request: CreateIncomeRequest) -> CreateIncomeCommand {
        CreateIncomeCommand {
            income_type_id: request.income_type_id,
            period: request.period,
            budget: request.budget,
            amount: request.amount,
            month_id: request.month_id,
        }
    }

    pub fn to_update_command(request: UpdateIncomeRequest) -> UpdateIncomeCommand {
        UpdateIncomeCommand {
            income_type_id: request.income_type_id,
            period: request.period,
            budget: request.budget,
            amount: request.amount,
            month_id: request.month_id,
        }
    }

    pub fn to_query(filters: IncomeFilters) -> IncomeQuery {
        IncomeQuery {
            period: filters.period,
            income_type_id: filters.income_type_id,
            month_id: filters.month_id,
        }
    }
}
