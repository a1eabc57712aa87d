//! # REST API for Users and Sign-in
//!
//! Public endpoints (behind the API key only) handle registration, sign-in and
//! password resets. `/me` and `/change-password` need a bearer token; user
//! administration needs an admin's token.
//!
//! Request bodies here carry passwords, so only emails and ids are logged.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{
    ChangePasswordRequest, CreateUserRequest, ForgotPasswordRequest, ForgotPasswordResponse,
    LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UpdateUserRequest,
};
use tracing::info;

use crate::io::rest::extract::{ApiJson, ApiPath};
use crate::io::rest::mappers::UserMapper;
use crate::io::rest::{AdminUser, CurrentUser};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/register - email: {}", request.email);

    match state
        .user_service
        .register(&request.email, &request.password, request.full_name)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(UserMapper::to_dto(user))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Exchange email and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/login - email: {}", request.email);

    let user = match state.user_service.authenticate(&request.email, &request.password).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    match state.token_service.issue_access_token(&user) {
        Ok(access_token) => (
            StatusCode::OK,
            Json(TokenResponse {
                access_token,
                token_type: "bearer".to_string(),
                user_id: user.id,
                email: user.email,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Issue a reset token. No mail is sent: the token is in the response when
/// the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/forgot-password - email: {}", request.email);

    match state.user_service.forgot_password(&request.email).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ForgotPasswordResponse {
                message: result.message,
                email_sent: false,
                token: result.token,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/reset-password");

    match state
        .user_service
        .reset_password(&request.token, &request.new_password)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Password reset successfully"))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    info!("GET /api/v1/auth/me - user: {}", user.email);
    (StatusCode::OK, Json(UserMapper::to_dto(user)))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/change-password - user: {}", user.email);

    match state
        .user_service
        .change_password(user.id, &request.current_password, &request.new_password)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Password changed successfully"))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_users(State(state): State<AppState>, AdminUser(admin): AdminUser) -> impl IntoResponse {
    info!("GET /api/v1/auth/users - admin: {}", admin.email);

    match state.user_service.list_users().await {
        Ok(users) => (StatusCode::OK, Json(UserMapper::to_dto_list(users))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/users - email: {}, admin: {}", request.email, admin.email);

    let command = UserMapper::to_create_command(request);
    match state
        .user_service
        .create_user(command, Some(admin.display_name()))
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(UserMapper::to_dto(user))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiPath(user_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("GET /api/v1/auth/users/{}", user_id);

    match state.user_service.get_user(user_id).await {
        Ok(user) => (StatusCode::OK, Json(UserMapper::to_dto(user))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> impl IntoResponse {
    info!("PUT /api/v1/auth/users/{} - request: {:?}", user_id, request);

    let command = UserMapper::to_update_command(request);
    match state
        .user_service
        .update_user(user_id, command, Some(admin.display_name()))
        .await
    {
        Ok(user) => (StatusCode::OK, Json(UserMapper::to_dto(user))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/v1/auth/users/{} - admin: {}", user_id, admin.email);

    match state.user_service.delete_user(user_id, admin.id).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("User deleted successfully"))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Outstanding resets, so an administrator can read out a short code
pub async fn list_password_resets(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> impl IntoResponse {
    info!("GET /api/v1/auth/password-resets");

    match state.user_service.active_resets().await {
        Ok(resets) => {
            let items: Vec<_> = resets.into_iter().map(UserMapper::to_reset_item).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn generate_reset_link(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<i64>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/users/{}/generate-reset-link - admin: {}", user_id, admin.email);

    match state.user_service.generate_reset_link(user_id).await {
        Ok(result) => (StatusCode::OK, Json(UserMapper::to_reset_link(result))).into_response(),
        Err(e) => e.into_response(),
    }
}
