// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::{credentials::CredentialError, token::TokenError};

// Envelope padrão de erro devolvido ao cliente: `{ status, message }`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = 404)]
    pub status: u16,
    #[schema(example = "Company not found")]
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    // --- Falhas de validação (culpa do cliente) ---
    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("Validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("User is not a staff member")]
    NotStaff,

    #[error("Invalid branch office ID: {0}")]
    InvalidBranch(String),

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("company_id is required when branch_offices are provided")]
    BranchesWithoutCompany,

    // --- Conflitos ---
    #[error("Username already taken")]
    UsernameTaken,

    // --- Autenticação ---
    #[error("Authorization header is required")]
    MissingToken,

    #[error("Invalid authorization header format")]
    MalformedAuthHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid or expired token")]
    ExpiredToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    // --- Não encontrados (inclui "existe mas é de outro tenant") ---
    #[error("User not found")]
    UserNotFound,

    #[error("Company not found")]
    CompanyNotFound,

    #[error("Branch office not found")]
    BranchNotFound,

    #[error("Staff member not found")]
    StaffNotFound,

    // --- Internos ---
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::ExpiredToken,
            TokenError::Invalid => AppError::InvalidToken,
            TokenError::Signing(e) => AppError::Signing(e.to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidBody(_)
            | AppError::ValidationError(_)
            | AppError::NotStaff
            | AppError::InvalidBranch(_)
            | AppError::IncorrectPassword
            | AppError::BranchesWithoutCompany => StatusCode::BAD_REQUEST,

            AppError::UsernameTaken => StatusCode::CONFLICT,

            AppError::MissingToken
            | AppError::MalformedAuthHeader
            | AppError::InvalidToken
            | AppError::ExpiredToken
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,

            AppError::UserNotFound
            | AppError::CompanyNotFound
            | AppError::BranchNotFound
            | AppError::StaffNotFound => StatusCode::NOT_FOUND,

            AppError::Credential(_)
            | AppError::Signing(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem segura para o cliente. Erros internos nunca expõem o texto original.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => describe_validation(errors),
            e if e.status_code() == StatusCode::INTERNAL_SERVER_ERROR => {
                "An unexpected error occurred".to_string()
            }
            e => e.to_string(),
        }
    }
}

fn describe_validation(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let reasons: Vec<String> = field_errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, reasons.join(", "))
        })
        .collect();
    fields.sort();

    if fields.is_empty() {
        "Invalid request body".to_string()
    } else {
        fields.join("; ")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Erro interno do servidor");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Requisição rejeitada");
        }

        let body = ErrorBody {
            status: status.as_u16(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
