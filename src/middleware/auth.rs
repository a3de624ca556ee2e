// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::Claims,
    services::token::TokenCodec,
};

/// Lê `Authorization: Bearer <token>` e valida o token.
/// Sem cabeçalho: `MissingToken`. Esquema errado ou token com espaço: `MalformedAuthHeader`.
pub fn require_identity(headers: &HeaderMap, codec: &TokenCodec) -> Result<Claims, AppError> {
    let authorization = match headers.typed_try_get::<Authorization<Bearer>>() {
        Ok(Some(authorization)) => authorization,
        Ok(None) => return Err(AppError::MissingToken),
        Err(_) => return Err(AppError::MalformedAuthHeader),
    };

    let token = authorization.token();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AppError::MalformedAuthHeader);
    }

    Ok(codec.verify(token)?)
}

// O middleware em si: coloca as claims nos "extensions" da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = require_identity(request.headers(), &app_state.token_codec)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// Extrator para obter a identidade autenticada diretamente nos handlers
pub struct AuthenticatedUser(pub Claims);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    use super::*;
    use crate::models::auth::Role;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_header_is_missing_token() {
        let codec = TokenCodec::new("unit-test-secret");
        let err = require_identity(&HeaderMap::new(), &codec).unwrap_err();
        assert!(matches!(err, AppError::MissingToken));
    }

    #[test]
    fn wrong_scheme_is_malformed() {
        let codec = TokenCodec::new("unit-test-secret");
        for value in ["Basic abc", "Token abc", "Bearer", "Bearer a b"] {
            let err = require_identity(&headers_with(value), &codec).unwrap_err();
            assert!(matches!(err, AppError::MalformedAuthHeader), "{value}");
        }
    }

    #[test]
    fn garbage_token_is_invalid() {
        let codec = TokenCodec::new("unit-test-secret");
        let err = require_identity(&headers_with("Bearer not.a.jwt"), &codec).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn valid_token_yields_claims() {
        let codec = TokenCodec::new("unit-test-secret");
        let token = codec.issue("u-1", &[Role::Staff]).unwrap();

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
        headers.insert(AUTHORIZATION, value);

        let claims = require_identity(&headers, &codec).unwrap();
        assert_eq!(claims.user_id, "u-1");
        assert_eq!(claims.roles, vec![Role::Staff]);
    }
}
