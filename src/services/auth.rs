// src/services/auth.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{UserFilter, UserRepository},
    models::auth::{AuthResponse, ProfilePatch, RegisterUserPayload, Role, User},
    services::{credentials::PasswordHasher, token::TokenCodec},
};

// Dados de uma conta nova, já validados pelo chamador
pub(crate) struct NewAccount {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub roles: Vec<Role>,
    pub company_id: Option<String>,
    pub branch_offices: Vec<String>,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, codec: Arc<TokenCodec>) -> Self {
        Self { users, hasher, codec }
    }

    /// Registro público. Empresa e filiais do payload são ignoradas aqui:
    /// vínculo só nasce pelo registro de staff ou pela atribuição.
    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<AuthResponse, AppError> {
        self.create_account(NewAccount {
            username: payload.username,
            password: payload.password,
            full_name: payload.full_name,
            roles: payload.roles,
            company_id: None,
            branch_offices: Vec::new(),
        })
        .await
    }

    pub(crate) async fn create_account(&self, account: NewAccount) -> Result<AuthResponse, AppError> {
        // 1. Username livre?
        if self.users.find_by_username(&account.username).await?.is_some() {
            return Err(AppError::UsernameTaken);
        }

        // 2. Hash da senha (bcrypt, fora do runtime)
        let password_hash = self.hasher.hash(&account.password).await?;

        // 3. Monta e persiste
        let mut user = User::new(account.username, password_hash, account.roles, Utc::now());
        user.full_name = account.full_name.filter(|name| !name.is_empty());
        user.company_id = account.company_id;
        user.branch_offices = account.branch_offices;

        self.users.insert(&user).await?;

        // 4. Token
        let token = self.codec.issue(&user.id, &user.roles)?;

        tracing::info!(user_id = %user.id, roles = ?user.roles, "Usuário registrado");
        Ok(AuthResponse { token, user })
    }

    // Usuário inexistente e senha errada dão o mesmo erro
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Hash corrompido responde igual a senha errada; a falha fica só no log
        let password_ok = self
            .hasher
            .verify(&user.password_hash, password)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(
                    user_id = %user.id,
                    error = %e,
                    "Falha ao verificar a senha no login"
                );
                false
            });
        if !password_ok {
            tracing::debug!(user_id = %user.id, "Senha incorreta no login");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.codec.issue(&user.id, &user.roles)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<User, AppError> {
        self.users
            .update_profile(user_id, &patch, Utc::now())
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.get_profile(user_id).await?;

        if !self.hasher.verify(&user.password_hash, current_password).await? {
            return Err(AppError::IncorrectPassword);
        }

        let new_hash = self.hasher.hash(new_password).await?;
        self.users
            .update_password(user_id, &new_hash, Utc::now())
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(user_id, "Senha alterada");
        Ok(())
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<Paginated<User>, AppError> {
        let total = self.users.count(&UserFilter::All).await?;
        let users = self.users.list(&UserFilter::All, page).await?;
        Ok(Paginated::new(users, total, page))
    }
}
