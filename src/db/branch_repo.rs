// src/db/branch_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::company::{BranchOffice, BranchPatch},
};

// Toda leitura/escrita usa o par (branch_id, company_id): o id da filial
// sozinho nunca é chave de busca.
#[async_trait]
pub trait BranchRepository: Send + Sync {
    async fn insert(&self, branch: &BranchOffice) -> Result<(), AppError>;

    async fn find(&self, branch_id: &str, company_id: &str) -> Result<Option<BranchOffice>, AppError>;

    async fn update(
        &self,
        branch_id: &str,
        company_id: &str,
        patch: &BranchPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BranchOffice>, AppError>;

    async fn delete(&self, branch_id: &str, company_id: &str) -> Result<u64, AppError>;

    async fn count(&self, company_id: &str) -> Result<u64, AppError>;

    async fn list(&self, company_id: &str, page: PageRequest) -> Result<Vec<BranchOffice>, AppError>;
}

const BRANCH_COLUMNS: &str = "id, company_id, name, address, phone, email, \
                              created_by, updated_by, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BranchRow {
    id: String,
    company_id: String,
    name: String,
    address: String,
    phone: String,
    email: String,
    created_by: String,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BranchRow> for BranchOffice {
    fn from(row: BranchRow) -> Self {
        BranchOffice {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgBranchRepository {
    pool: PgPool,
}

impl PgBranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BranchRepository for PgBranchRepository {
    async fn insert(&self, branch: &BranchOffice) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO branch_offices (
                id, company_id, name, address, phone, email,
                created_by, updated_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.company_id)
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(&branch.phone)
        .bind(&branch.email)
        .bind(&branch.created_by)
        .bind(&branch.updated_by)
        .bind(branch.created_at)
        .bind(branch.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, branch_id: &str, company_id: &str) -> Result<Option<BranchOffice>, AppError> {
        let row = sqlx::query_as::<_, BranchRow>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM branch_offices WHERE id = $1 AND company_id = $2"
        ))
        .bind(branch_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BranchOffice::from))
    }

    async fn update(
        &self,
        branch_id: &str,
        company_id: &str,
        patch: &BranchPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BranchOffice>, AppError> {
        let row = sqlx::query_as::<_, BranchRow>(&format!(
            "UPDATE branch_offices SET \
                name = COALESCE($3, name), \
                address = COALESCE($4, address), \
                phone = COALESCE($5, phone), \
                email = COALESCE($6, email), \
                updated_by = $7, \
                updated_at = $8 \
             WHERE id = $1 AND company_id = $2 RETURNING {BRANCH_COLUMNS}"
        ))
        .bind(branch_id)
        .bind(company_id)
        .bind(&patch.name)
        .bind(&patch.address)
        .bind(&patch.phone)
        .bind(&patch.email)
        .bind(updated_by)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BranchOffice::from))
    }

    async fn delete(&self, branch_id: &str, company_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM branch_offices WHERE id = $1 AND company_id = $2")
            .bind(branch_id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self, company_id: &str) -> Result<u64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branch_offices WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn list(&self, company_id: &str, page: PageRequest) -> Result<Vec<BranchOffice>, AppError> {
        let (offset, limit) = page.sql_window();

        let rows = sqlx::query_as::<_, BranchRow>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM branch_offices WHERE company_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BranchOffice::from).collect())
    }
}
