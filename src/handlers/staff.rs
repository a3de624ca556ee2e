// src/handlers/staff.rs

use axum::{
    extract::{Path, Query, State},
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
        auth::User,
        staff::{AssignStaffPayload, StaffAssignment},
    },
};

// Empresa vem da rota. Sem `branch_offices` no corpo, vale só a filial da rota.
#[utoipa::path(
    post,
    path = "/api/companies/{id}/branches/{branch_id}/staff",
    tag = "Staff",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        ("branch_id" = String, Path, description = "ID da filial")
    ),
    request_body = AssignStaffPayload,
    responses(
        (status = 200, description = "Vínculo sobrescrito", body = User),
        (status = 400, description = "Não é staff ou filial inválida", body = ErrorBody),
        (status = 404, description = "Usuário ou empresa não encontrados", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_staff(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((company_id, branch_id)): Path<(String, String)>,
    ValidatedJson(payload): ValidatedJson<AssignStaffPayload>,
) -> Result<Json<User>, AppError> {
    let branch_ids = payload.branch_offices.unwrap_or_else(|| vec![branch_id]);

    let user = app_state
        .tenancy_service
        .assign_staff(&company_id, &payload.user_id, branch_ids, &claims.user_id)
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}/branches/{branch_id}/staff/{user_id}",
    tag = "Staff",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        ("branch_id" = String, Path, description = "ID da filial"),
        ("user_id" = String, Path, description = "ID do staff")
    ),
    responses(
        (status = 200, description = "Filial retirada do vínculo", body = User),
        (status = 404, description = "Staff não vinculado a esta filial", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_staff(
    State(app_state): State<AppState>,
    Path((company_id, branch_id, user_id)): Path<(String, String, String)>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .tenancy_service
        .remove_staff_from_branch(&company_id, &branch_id, &user_id)
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/branches/{branch_id}/staff",
    tag = "Staff",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        ("branch_id" = String, Path, description = "ID da filial"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Staff da filial", body = Paginated<User>),
        (status = 404, description = "Filial não encontrada nesta empresa", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_branch_staff(
    State(app_state): State<AppState>,
    Path((company_id, branch_id)): Path<(String, String)>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<User>>, AppError> {
    let page = app_state
        .tenancy_service
        .list_branch_staff(&company_id, &branch_id, PageRequest::from(query))
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/assignments",
    tag = "Staff",
    params(
        ("id" = String, Path, description = "ID da empresa"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Histórico de atribuições, mais recente primeiro", body = Paginated<StaffAssignment>),
        (status = 404, description = "Empresa não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_assignments(
    State(app_state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<StaffAssignment>>, AppError> {
    let page = app_state
        .tenancy_service
        .list_assignments(&company_id, PageRequest::from(query))
        .await?;
    Ok(Json(page))
}
