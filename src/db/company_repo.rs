// src/db/company_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::company::{Company, CompanyPatch},
};

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn insert(&self, company: &Company) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Company>, AppError>;

    async fn update(
        &self,
        id: &str,
        patch: &CompanyPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Company>, AppError>;

    /// Devolve quantas linhas foram apagadas (0 ou 1).
    async fn delete(&self, id: &str) -> Result<u64, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    async fn list(&self, page: PageRequest) -> Result<Vec<Company>, AppError>;
}

const COMPANY_COLUMNS: &str = "id, name, address, phone, email, website, tax_id, business_type, \
                               created_by, updated_by, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: String,
    name: String,
    address: String,
    phone: String,
    email: String,
    website: Option<String>,
    tax_id: String,
    business_type: String,
    created_by: String,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            website: row.website,
            tax_id: row.tax_id,
            business_type: row.business_type,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn insert(&self, company: &Company) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, address, phone, email, website, tax_id, business_type,
                created_by, updated_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.website)
        .bind(&company.tax_id)
        .bind(&company.business_type)
        .bind(&company.created_by)
        .bind(&company.updated_by)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Company::from))
    }

    async fn update(
        &self,
        id: &str,
        patch: &CompanyPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "UPDATE companies SET \
                name = COALESCE($2, name), \
                address = COALESCE($3, address), \
                phone = COALESCE($4, phone), \
                email = COALESCE($5, email), \
                website = COALESCE($6, website), \
                tax_id = COALESCE($7, tax_id), \
                business_type = COALESCE($8, business_type), \
                updated_by = $9, \
                updated_at = $10 \
             WHERE id = $1 RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.address)
        .bind(&patch.phone)
        .bind(&patch.email)
        .bind(&patch.website)
        .bind(&patch.tax_id)
        .bind(&patch.business_type)
        .bind(updated_by)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Company::from))
    }

    async fn delete(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Company>, AppError> {
        let (offset, limit) = page.sql_window();

        let rows = sqlx::query_as::<_, CompanyRow>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Company::from).collect())
    }
}
