// src/app.rs

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    config::{AppState, CorsSettings},
    docs, handlers,
    middleware::{auth::auth_guard, logger::request_logger, rate_limit::rate_limit},
};

// "*" espelha a origem do pedido: credenciais não combinam com curinga literal
fn cors_layer(cors: &CorsSettings) -> CorsLayer {
    let origins = if cors.allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            cors.allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
        .collect();

    let headers: Vec<HeaderName> = cors
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(cors.max_age)
}

/// Monta todas as rotas. Ordem das camadas, de fora para dentro:
/// CORS, rate limit, logger e, só nas rotas protegidas, o guard de autenticação.
pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/staff/register", post(handlers::auth::register_staff));

    // Rotas protegidas pelo middleware
    let protected_routes = Router::new()
        .route("/api/users", get(handlers::users::list_users))
        .route(
            "/api/users/profile",
            get(handlers::users::get_profile).put(handlers::users::update_profile),
        )
        .route("/api/users/password", put(handlers::users::update_password))
        .route(
            "/api/companies",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/api/companies/{id}",
            get(handlers::companies::get_company)
                .put(handlers::companies::update_company)
                .delete(handlers::companies::delete_company),
        )
        .route(
            "/api/companies/{id}/branches",
            post(handlers::branches::create_branch).get(handlers::branches::list_branches),
        )
        .route(
            "/api/companies/{id}/branches/{branch_id}",
            get(handlers::branches::get_branch)
                .put(handlers::branches::update_branch)
                .delete(handlers::branches::delete_branch),
        )
        .route(
            "/api/companies/{id}/branches/{branch_id}/staff",
            post(handlers::staff::assign_staff).get(handlers::staff::list_branch_staff),
        )
        .route(
            "/api/companies/{id}/branches/{branch_id}/staff/{user_id}",
            delete(handlers::staff::remove_staff),
        )
        .route(
            "/api/companies/{id}/assignments",
            get(handlers::staff::list_assignments),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let rate_limiter = app_state.rate_limiter.clone();
    let cors = cors_layer(&app_state.config.cors);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/openapi.json", get(docs::openapi_json))
        .nest("/api/auth", auth_routes)
        .merge(protected_routes)
        .layer(axum_middleware::from_fn(request_logger))
        .layer(axum_middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(cors)
        .with_state(app_state)
}
