// src/services/token.rs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;

use crate::models::auth::{Claims, Role};

pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token inválido")]
    Invalid,

    #[error("token expirado")]
    Expired,

    #[error("falha ao assinar o token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Emite e valida os tokens de sessão (JWT HS256).
/// A chave é carregada uma vez na subida e não muda mais.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "iat"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: &str, roles: &[Role]) -> Result<String, TokenError> {
        self.issue_at(user_id, roles, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        roles: &[Role],
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            roles: roles.to_vec(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Assinatura primeiro, depois a janela `nbf <= agora < exp`. Nada é consultado no banco.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        // O jsonwebtoken aceita `exp == agora`; aqui o fim da janela é exclusivo
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
