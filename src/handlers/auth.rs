// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    common::{
        error::{AppError, ErrorBody},
        extract::ValidatedJson,
    },
    config::AppState,
    models::auth::{AuthResponse, LoginUserPayload, RegisterUserPayload},
};

// Handler de registro
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = AuthResponse),
        (status = 400, description = "Corpo inválido", body = ErrorBody),
        (status = 409, description = "Username em uso", body = ErrorBody)
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterUserPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = app_state.auth_service.register_user(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login efetuado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas", body = ErrorBody)
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(response))
}

// Registro de staff (público, como no registro comum)
#[utoipa::path(
    post,
    path = "/api/auth/staff/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Staff criado", body = AuthResponse),
        (status = 400, description = "Filial inválida ou filiais sem empresa", body = ErrorBody),
        (status = 404, description = "Empresa não encontrada", body = ErrorBody),
        (status = 409, description = "Username em uso", body = ErrorBody)
    )
)]
pub async fn register_staff(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterUserPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = app_state.tenancy_service.register_staff(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
