// src/models/auth.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::extract::empty_string_as_none;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Super,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Super => "super",
            Role::Staff => "staff",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "super" => Ok(Role::Super),
            "staff" => Ok(Role::Staff),
            other => Err(anyhow::anyhow!("papel desconhecido: {}", other)),
        }
    }
}

/// Conjunto ordenado de papéis: remove duplicados mantendo a primeira ocorrência
/// e cai para `[user]` quando nada foi informado.
pub fn normalize_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut normalized: Vec<Role> = Vec::with_capacity(roles.len());
    for role in roles {
        if !normalized.contains(&role) {
            normalized.push(role);
        }
    }
    if normalized.is_empty() {
        normalized.push(Role::User);
    }
    normalized
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    #[schema(example = "5f1d7c2e-3b4a-4c6d-9e8f-0a1b2c3d4e5f")]
    pub id: String,

    #[schema(example = "alice")]
    pub username: String,

    #[serde(skip_serializing)] // nunca sai na resposta
    #[schema(ignore)]
    pub password_hash: String,

    pub roles: Vec<Role>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,

    // Vínculo "vivo" com a empresa e as filiais
    pub company_id: Option<String>,
    pub branch_offices: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String, roles: Vec<Role>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash,
            roles: normalize_roles(roles),
            full_name: None,
            bio: None,
            avatar: None,
            company_id: None,
            branch_offices: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.roles.contains(&Role::Staff)
    }

    /// Só staff tem acesso por filial, independente da empresa.
    pub fn can_access_branch(&self, branch_id: &str) -> bool {
        self.is_staff() && self.branch_offices.iter().any(|b| b == branch_id)
    }
}

// Atualização parcial do perfil: `None` = campo não informado
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 3, max = 32, message = "must be between 3 and 32 characters"))]
    #[schema(example = "alice")]
    pub username: String,

    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    #[schema(example = "secret1")]
    pub password: String,

    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub full_name: Option<String>,

    #[serde(default)]
    pub roles: Vec<Role>,

    // Usados apenas no registro de staff
    pub company_id: Option<String>,
    #[serde(default)]
    pub branch_offices: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 3, max = 32, message = "must be between 3 and 32 characters"))]
    pub username: String,

    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfilePayload {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub full_name: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub bio: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub avatar: Option<String>,
}

impl From<UpdateProfilePayload> for ProfilePatch {
    fn from(payload: UpdateProfilePayload) -> Self {
        Self {
            full_name: payload.full_name,
            bio: payload.bio,
            avatar: payload.avatar,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePasswordPayload {
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub current_password: String,

    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub new_password: String,
}

// Resposta de autenticação com o token e o usuário (sem a senha)
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Password updated successfully")]
    pub message: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub roles: Vec<Role>,
    pub iat: i64, // Issued At
    pub nbf: i64, // Not Before
    pub exp: i64, // Expiration time (sempre iat + 24h)
}
