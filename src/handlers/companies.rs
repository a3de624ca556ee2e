// src/handlers/companies.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
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
    models::{
        auth::MessageResponse,
        company::{Company, CreateCompanyPayload, UpdateCompanyPayload},
    },
};

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 400, description = "Corpo inválido", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CreateCompanyPayload>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let company = app_state
        .company_service
        .create_company(payload, &claims.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = String, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa", body = Company),
        (status = 404, description = "Empresa não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<Json<Company>, AppError> {
    let company = app_state.company_service.get_company(&company_id).await?;
    Ok(Json(company))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = String, Path, description = "ID da empresa")),
    request_body = UpdateCompanyPayload,
    responses(
        (status = 200, description = "Empresa atualizada", body = Company),
        (status = 404, description = "Empresa não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(company_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    let company = app_state
        .company_service
        .update_company(&company_id, payload.into(), &claims.user_id)
        .await?;
    Ok(Json(company))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = String, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa removida", body = MessageResponse),
        (status = 404, description = "Empresa não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.company_service.delete_company(&company_id).await?;
    Ok(Json(MessageResponse {
        message: "Company deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Empresas, mais novas primeiro", body = Paginated<Company>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Company>>, AppError> {
    let page = app_state
        .company_service
        .list_companies(PageRequest::from(query))
        .await?;
    Ok(Json(page))
}
