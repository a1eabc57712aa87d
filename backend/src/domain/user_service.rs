//! User accounts: registration, sign-in, password changes and resets, and
//! administration.
//!
//! ## Business Rules
//!
//! - Emails are trimmed and unique; passwords are stored only as Argon2 hashes
//! - Inactive accounts cannot sign in
//! - A reset token (or its six-digit short code) works once, within 24 hours
//! - Administrators cannot delete their own account

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::users::{
    ActiveReset, CreateUserCommand, ForgotPasswordResult, ResetLinkResult, UpdateUserCommand,
};
use crate::domain::error::{BudgetError, BudgetResult};
use crate::domain::models::user::{NewUser, User};
use crate::domain::passwords;
use crate::storage::{Connection, UserStorage};

pub const RESET_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct UserService<C: Connection> {
    user_repository: C::UserRepository,
}

impl<C: Connection> UserService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
        }
    }

    pub async fn create_user(&self, command: CreateUserCommand, created_by: Option<&str>) -> BudgetResult<User> {
        let email = validate_email(&command.email)?;
        validate_password(&command.password)?;
        info!("Creating user {} (admin: {})", email, command.is_admin);

        if self.user_repository.get_user_by_email(&email).await?.is_some() {
            return Err(BudgetError::validation("User with this email already exists"));
        }

        let new_user = NewUser {
            email,
            password_hash: passwords::hash_password(&command.password)?,
            full_name: clean_name(command.full_name),
            is_active: command.is_active,
            is_admin: command.is_admin,
        };
        let user = self.user_repository.insert_user(&new_user, created_by).await?;

        info!("Created user {} with ID {}", user.email, user.id);
        Ok(user)
    }

    /// Self-service sign-up: always an active, non-admin account
    pub async fn register(&self, email: &str, password: &str, full_name: Option<String>) -> BudgetResult<User> {
        let command = CreateUserCommand {
            email: email.to_string(),
            password: password.to_string(),
            full_name,
            is_active: true,
            is_admin: false,
        };
        self.create_user(command, None).await
    }

    /// Check credentials for sign-in
    pub async fn authenticate(&self, email: &str, password: &str) -> BudgetResult<User> {
        let email = email.trim();
        let Some(user) = self.user_repository.get_user_by_email(email).await? else {
            warn!("Sign-in for unknown email {}", email);
            return Err(BudgetError::unauthorized("Invalid email or password"));
        };

        if !passwords::verify_password(password, &user.password_hash) {
            warn!("Wrong password for {}", email);
            return Err(BudgetError::unauthorized("Invalid email or password"));
        }
        if !user.is_active {
            warn!("Sign-in refused for inactive user {}", email);
            return Err(BudgetError::unauthorized("User account is inactive"));
        }

        info!("User {} signed in", user.email);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> BudgetResult<User> {
        self.user_repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| BudgetError::not_found("User not found"))
    }

    /// All users ordered by email
    pub async fn list_users(&self) -> BudgetResult<Vec<User>> {
        Ok(self.user_repository.list_users().await?)
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        command: UpdateUserCommand,
        updated_by: Option<&str>,
    ) -> BudgetResult<User> {
        info!("Updating user {}: {:?}", user_id, command);
        let mut user = self.get_user(user_id).await?;

        if let Some(email) = &command.email {
            let email = validate_email(email)?;
            if email != user.email {
                if self.user_repository.get_user_by_email(&email).await?.is_some() {
                    return Err(BudgetError::validation("User with this email already exists"));
                }
                user.email = email;
            }
        }
        if let Some(full_name) = command.full_name {
            user.full_name = clean_name(full_name);
        }
        if let Some(is_active) = command.is_active {
            user.is_active = is_active;
        }
        if let Some(is_admin) = command.is_admin {
            user.is_admin = is_admin;
        }

        Ok(self.user_repository.update_user(&user, updated_by).await?)
    }

    pub async fn delete_user(&self, user_id: i64, acting_user_id: i64) -> BudgetResult<()> {
        let user = self.get_user(user_id).await?;
        if user.id == acting_user_id {
            return Err(BudgetError::validation("Cannot delete your own account"));
        }

        self.user_repository.delete_user(user_id).await?;
        info!("Deleted user {} with ID {}", user.email, user_id);
        Ok(())
    }

    pub async fn change_password(&self, user_id: i64, current: &str, new_password: &str) -> BudgetResult<()> {
        let mut user = self.get_user(user_id).await?;
        if !passwords::verify_password(current, &user.password_hash) {
            return Err(BudgetError::validation("Current password is incorrect"));
        }
        validate_password(new_password)?;

        user.password_hash = passwords::hash_password(new_password)?;
        let name = user.display_name().to_string();
        self.user_repository.update_user(&user, Some(&name)).await?;
        info!("User {} changed their password", user.email);
        Ok(())
    }

    /// Start a reset. The answer does not reveal whether the email is known.
    pub async fn forgot_password(&self, email: &str) -> BudgetResult<ForgotPasswordResult> {
        let Some(user) = self.user_repository.get_user_by_email(email.trim()).await? else {
            return Ok(ForgotPasswordResult {
                message: "If the email exists, a password reset link has been sent".to_string(),
                token: None,
            });
        };

        let (token, _) = self.issue_reset(&user, Utc::now()).await?;
        Ok(ForgotPasswordResult {
            message: "Password reset token generated".to_string(),
            token: Some(token),
        })
    }

    /// Redeem a reset token or short code
    pub async fn reset_password(&self, token: &str, new_password: &str) -> BudgetResult<()> {
        let reset = self
            .user_repository
            .find_reset(token.trim())
            .await?
            .ok_or_else(|| BudgetError::validation("Invalid or expired reset token"))?;

        if reset.is_expired(Utc::now()) {
            return Err(BudgetError::validation("Reset token has expired"));
        }
        if reset.used {
            return Err(BudgetError::validation("Reset token has already been used"));
        }
        validate_password(new_password)?;

        let mut user = self.get_user(reset.user_id).await?;
        user.password_hash = passwords::hash_password(new_password)?;
        let name = user.display_name().to_string();
        self.user_repository.update_user(&user, Some(&name)).await?;
        self.user_repository.mark_reset_used(reset.id).await?;

        info!("Password reset for {}", user.email);
        Ok(())
    }

    pub async fn active_resets(&self) -> BudgetResult<Vec<ActiveReset>> {
        let now = Utc::now();
        let resets = self.user_repository.list_active_resets(now).await?;
        Ok(resets
            .into_iter()
            .map(|(reset, user_email)| ActiveReset {
                user_email,
                short_code: reset.short_code,
                created_at: reset.created_at,
                expires_at: reset.expires_at,
                minutes_remaining: (reset.expires_at - now).num_minutes().max(0),
            })
            .collect())
    }

    /// Issue a reset on a user's behalf so an administrator can pass it on
    pub async fn generate_reset_link(&self, user_id: i64) -> BudgetResult<ResetLinkResult> {
        let user = self.get_user(user_id).await?;
        let (token, short_code) = self.issue_reset(&user, Utc::now()).await?;

        Ok(ResetLinkResult {
            user,
            token,
            short_code,
            expires_in_minutes: RESET_TOKEN_TTL_HOURS * 60,
        })
    }

    /// Create the administrator account, or promote it if it already exists
    pub async fn ensure_admin(&self, email: &str, password: &str) -> BudgetResult<User> {
        let email = validate_email(email)?;
        match self.user_repository.get_user_by_email(&email).await? {
            Some(user) if user.is_admin => Ok(user),
            Some(mut user) => {
                user.is_admin = true;
                info!("Promoting {} to administrator", email);
                Ok(self.user_repository.update_user(&user, None).await?)
            }
            None => {
                let command = CreateUserCommand {
                    email,
                    password: password.to_string(),
                    full_name: Some("Administrator".to_string()),
                    is_active: true,
                    is_admin: true,
                };
                self.create_user(command, None).await
            }
        }
    }

    async fn issue_reset(&self, user: &User, now: DateTime<Utc>) -> BudgetResult<(String, String)> {
        let token = passwords::random_token();
        let short_code = passwords::short_code();
        let expires_at = now + Duration::hours(RESET_TOKEN_TTL_HOURS);

        self.user_repository
            .insert_reset(user.id, &token, &short_code, expires_at)
            .await?;
        info!("Issued password reset for {} until {}", user.email, expires_at);
        Ok((token, short_code))
    }
}

fn validate_email(email: &str) -> BudgetResult<String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(BudgetError::validation("A valid email address is required"));
    }
    Ok(email.to_string())
}

fn validate_password(password: &str) -> BudgetResult<()> {
    if password.is_empty() {
        return Err(BudgetError::validation("Password cannot be empty"));
    }
    Ok(())
}

fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
