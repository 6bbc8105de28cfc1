use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;
use tracing::info;

use crate::dtos::{DummyLoginRequest, LoginRequest, RegisterRequest, TokenResponse};
use crate::models::User;
use crate::startup::AppState;
use crate::utils::{Password, ValidatedJson};

/// Fixed identity behind `/dummyLogin` tokens.
pub const DUMMY_LOGIN_EMAIL: &str = "testuser@mail.ru";

/// Issue a token for the requested role without credentials.
pub async fn dummy_login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DummyLoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state.jwt.generate_token(DUMMY_LOGIN_EMAIL, req.role)?;
    info!(role = %req.role, "Dummy token issued");
    Ok(Json(TokenResponse { token }))
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .users
        .register(&req.email, &Password::new(req.password), req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .users
        .authenticate(&req.email, &Password::new(req.password))
        .await?;
    let token = state.jwt.generate_token(&user.email, user.role)?;
    info!(user_id = %user.id, "User logged in");
    Ok(Json(TokenResponse { token }))
}
