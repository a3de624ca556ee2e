// src/docs.rs

use axum::Json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::register_staff,

        // --- Users ---
        handlers::users::get_profile,
        handlers::users::update_profile,
        handlers::users::update_password,
        handlers::users::list_users,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::delete_company,
        handlers::companies::list_companies,

        // --- Branches ---
        handlers::branches::create_branch,
        handlers::branches::get_branch,
        handlers::branches::update_branch,
        handlers::branches::delete_branch,
        handlers::branches::list_branches,

        // --- Staff ---
        handlers::staff::assign_staff,
        handlers::staff::remove_staff,
        handlers::staff::list_branch_staff,
        handlers::staff::list_assignments,
    ),
    components(
        schemas(
            common::error::ErrorBody,
            common::pagination::PaginationMeta,

            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::UpdatePasswordPayload,
            models::auth::AuthResponse,
            models::auth::MessageResponse,

            models::company::Company,
            models::company::BranchOffice,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,
            models::company::CreateBranchPayload,
            models::company::UpdateBranchPayload,

            models::staff::StaffAssignment,
            models::staff::AssignStaffPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Registro e login"),
        (name = "Users", description = "Perfil e listagem de usuários"),
        (name = "Companies", description = "Empresas (tenants)"),
        (name = "Branches", description = "Filiais de uma empresa"),
        (name = "Staff", description = "Vínculo de staff com filiais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

// GET /api/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
