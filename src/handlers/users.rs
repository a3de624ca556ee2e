// src/handlers/users.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::{
        error::{AppError, ErrorBody},
        extract::ValidatedJson,
        pagination::{PageRequest, Paginated, PaginationQuery},
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{MessageResponse, UpdatePasswordPayload, UpdateProfilePayload, User},
};

#[utoipa::path(
    get,
    path = "/api/users/profile",
    tag = "Users",
    responses(
        (status = 200, description = "Perfil do usuário logado", body = User),
        (status = 401, description = "Não autenticado", body = ErrorBody),
        (status = 404, description = "Usuário não existe mais", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    let user = app_state.auth_service.get_profile(&claims.user_id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = User),
        (status = 400, description = "Corpo inválido", body = ErrorBody),
        (status = 404, description = "Usuário não encontrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfilePayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .auth_service
        .update_profile(&claims.user_id, payload.into())
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/password",
    tag = "Users",
    request_body = UpdatePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada", body = MessageResponse),
        (status = 400, description = "Senha atual incorreta", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<UpdatePasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state
        .auth_service
        .update_password(&claims.user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Usuários, mais novos primeiro", body = Paginated<User>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<User>>, AppError> {
    let page = app_state.auth_service.list_users(PageRequest::from(query)).await?;
    Ok(Json(page))
}
