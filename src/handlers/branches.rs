// src/handlers/branches.rs

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
        company::{BranchOffice, CreateBranchPayload, UpdateBranchPayload},
    },
};

#[utoipa::path(
    post,
    path = "/api/companies/{id}/branches",
    tag = "Branches",
    params(("id" = String, Path, description = "ID da empresa")),
    request_body = CreateBranchPayload,
    responses(
        (status = 201, description = "Filial criada", body = BranchOffice),
        (status = 404, description = "Empresa não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(company_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CreateBranchPayload>,
) -> Result<(StatusCode, Json<BranchOffice>), AppError> {
    let branch = app_state
        .tenancy_service
        .create_branch(&company_id, payload, &claims.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/branches/{branch_id}",
    tag = "Branches",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        ("branch_id" = String, Path, description = "ID da filial")
    ),
    responses(
        (status = 200, description = "Filial", body = BranchOffice),
        (status = 404, description = "Filial não encontrada nesta empresa", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_branch(
    State(app_state): State<AppState>,
    Path((company_id, branch_id)): Path<(String, String)>,
) -> Result<Json<BranchOffice>, AppError> {
    let branch = app_state
        .tenancy_service
        .get_branch(&company_id, &branch_id)
        .await?;
    Ok(Json(branch))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}/branches/{branch_id}",
    tag = "Branches",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        ("branch_id" = String, Path, description = "ID da filial")
    ),
    request_body = UpdateBranchPayload,
    responses(
        (status = 200, description = "Filial atualizada", body = BranchOffice),
        (status = 404, description = "Filial não encontrada nesta empresa", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((company_id, branch_id)): Path<(String, String)>,
    ValidatedJson(payload): ValidatedJson<UpdateBranchPayload>,
) -> Result<Json<BranchOffice>, AppError> {
    let branch = app_state
        .tenancy_service
        .update_branch(&company_id, &branch_id, payload.into(), &claims.user_id)
        .await?;
    Ok(Json(branch))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}/branches/{branch_id}",
    tag = "Branches",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        ("branch_id" = String, Path, description = "ID da filial")
    ),
    responses(
        (status = 200, description = "Filial removida", body = MessageResponse),
        (status = 404, description = "Filial não encontrada nesta empresa", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_branch(
    State(app_state): State<AppState>,
    Path((company_id, branch_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state
        .tenancy_service
        .delete_branch(&company_id, &branch_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Branch office deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/branches",
    tag = "Branches",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Filiais da empresa", body = Paginated<BranchOffice>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<BranchOffice>>, AppError> {
    let page = app_state
        .tenancy_service
        .list_branches(&company_id, PageRequest::from(query))
        .await?;
    Ok(Json(page))
}
