// src/db/user_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::auth::{ProfilePatch, Role, User},
};

/// Filtros de listagem de usuários.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    All,
    // Staff com vínculo vivo na filial (papel staff + empresa + filial na lista)
    BranchStaff { company_id: String, branch_id: String },
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Busca o usuário só se ele estiver vinculado ao par (empresa, filial).
    async fn find_member(
        &self,
        user_id: &str,
        company_id: &str,
        branch_id: &str,
    ) -> Result<Option<User>, AppError>;

    /// Falha com `UsernameTaken` se o username já existir.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    /// Sobrescreve (não mescla) empresa e filiais.
    async fn set_membership(
        &self,
        id: &str,
        company_id: &str,
        branch_offices: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    async fn set_branch_offices(
        &self,
        id: &str,
        branch_offices: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    async fn count(&self, filter: &UserFilter) -> Result<u64, AppError>;

    /// Ordenado por `created_at` decrescente.
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Vec<User>, AppError>;
}

// ---
// Implementação Postgres
// ---

const USER_COLUMNS: &str = "id, username, password_hash, roles, full_name, bio, avatar, \
                            company_id, branch_offices, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    roles: Vec<String>,
    full_name: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
    company_id: Option<String>,
    branch_offices: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            roles,
            full_name: row.full_name,
            bio: row.bio,
            avatar: row.avatar,
            company_id: row.company_id,
            branch_offices: row.branch_offices,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, AppError> {
    row.map(User::try_from).transpose()
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn find_member(
        &self,
        user_id: &str,
        company_id: &str,
        branch_id: &str,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE id = $1 AND company_id = $2 AND $3 = ANY(branch_offices)"
        ))
        .bind(user_id)
        .bind(company_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let roles: Vec<String> = user.roles.iter().map(|r| r.as_str().to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, password_hash, roles, full_name, bio, avatar,
                company_id, branch_offices, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&roles)
        .bind(&user.full_name)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(&user.company_id)
        .bind(&user.branch_offices)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Corrida entre a checagem de username e o insert
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::UsernameTaken;
                }
            }
            e.into()
        })?;

        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                full_name = COALESCE($2, full_name), \
                bio = COALESCE($3, bio), \
                avatar = COALESCE($4, avatar), \
                updated_at = $5 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.full_name)
        .bind(&patch.bio)
        .bind(&patch.avatar)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET password_hash = $2, updated_at = $3 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn set_membership(
        &self,
        id: &str,
        company_id: &str,
        branch_offices: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET company_id = $2, branch_offices = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(company_id)
        .bind(branch_offices)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn set_branch_offices(
        &self,
        id: &str,
        branch_offices: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET branch_offices = $2, updated_at = $3 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(branch_offices)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, AppError> {
        let total: i64 = match filter {
            UserFilter::All => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await?
            }
            UserFilter::BranchStaff { company_id, branch_id } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users \
                     WHERE 'staff' = ANY(roles) AND company_id = $1 AND $2 = ANY(branch_offices)",
                )
                .bind(company_id)
                .bind(branch_id)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(total.max(0) as u64)
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Vec<User>, AppError> {
        let (offset, limit) = page.sql_window();

        let rows = match filter {
            UserFilter::All => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            UserFilter::BranchStaff { company_id, branch_id } => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE 'staff' = ANY(roles) AND company_id = $1 AND $2 = ANY(branch_offices) \
                     ORDER BY created_at DESC LIMIT $3 OFFSET $4"
                ))
                .bind(company_id)
                .bind(branch_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(User::try_from).collect()
    }
}
