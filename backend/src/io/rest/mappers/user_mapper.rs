use shared::{
    CreateUserRequest, GenerateResetLinkResponse, PasswordResetItem, UpdateUserRequest,
    User as SharedUser,
};

use crate::domain::commands::users::{
    ActiveReset, CreateUserCommand, ResetLinkResult, UpdateUserCommand,
};
use crate::domain::models::user::User as DomainUser;

/// Mapper for accounts and password resets. Password hashes never leave the domain.
pub struct UserMapper;

impl UserMapper {
    pub fn to_dto(domain: DomainUser) -> SharedUser {
        SharedUser {
            id: domain.id,
            email: domain.email,
            full_name: domain.full_name,
            is_active: domain.is_active,
            is_admin: domain.is_admin,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
            created_by: domain.created_by,
            updated_by: domain.updated_by,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainUser>) -> Vec<SharedUser> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_create_command(request: CreateUserRequest) -> CreateUserCommand {
        CreateUserCommand {
            email: request.email,
            password: request.password,
            full_name: request.full_name,
            is_active: request.is_active,
            is_admin: request.is_admin,
        }
    }

    pub fn to_update_command(request: UpdateUserRequest) -> UpdateUserCommand {
        UpdateUserCommand {
            email: request.email,
            full_name: request.full_name,
            is_active: request.is_active,
            is_admin: request.is_admin,
        }
    }

    pub fn to_reset_item(reset: ActiveReset) -> PasswordResetItem {
        PasswordResetItem {
            user_email: reset.user_email,
            short_code: reset.short_code,
            created_at: reset.created_at.to_rfc3339(),
            expires_at: reset.expires_at.to_rfc3339(),
            minutes_remaining: reset.minutes_remaining,
        }
    }

    /// The link points at the client's reset page, relative to its origin
    pub fn to_reset_link(result: ResetLinkResult) -> GenerateResetLinkResponse {
        GenerateResetLinkResponse {
            user_email: result.user.email,
            reset_url: format!("/reset-password?token={}", result.token),
            short_code: result.short_code,
            expires_in_minutes: result.expires_in_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_to_dto_hides_password_hash() {
        let now = Utc::now();
        let user = DomainUser {
            id: 3,
            email: "amy@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: None,
            is_active: true,
            is_admin: false,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: Some("root".to_string()),
        };

        let dto = UserMapper::to_dto(user);
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("argon2"));
        assert_eq!(dto.created_at, now.to_rfc3339());
        assert_eq!(dto.updated_by.as_deref(), Some("root"));
    }
}
