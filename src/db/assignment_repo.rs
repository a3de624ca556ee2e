// src/db/assignment_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::staff::StaffAssignment,
};

// Ledger append-only: só inserção e leitura.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn append(&self, entry: &StaffAssignment) -> Result<(), AppError>;

    async fn count_by_company(&self, company_id: &str) -> Result<u64, AppError>;

    /// Ordenado por `assigned_at` decrescente.
    async fn list_by_company(
        &self,
        company_id: &str,
        page: PageRequest,
    ) -> Result<Vec<StaffAssignment>, AppError>;
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    user_id: String,
    company_id: String,
    branch_offices: Vec<String>,
    assigned_at: DateTime<Utc>,
    assigned_by: String,
}

impl From<AssignmentRow> for StaffAssignment {
    fn from(row: AssignmentRow) -> Self {
        StaffAssignment {
            user_id: row.user_id,
            company_id: row.company_id,
            branch_offices: row.branch_offices,
            assigned_at: row.assigned_at,
            assigned_by: row.assigned_by,
        }
    }
}

#[derive(Clone)]
pub struct PgAssignmentRepository {
    pool: PgPool,
}

impl PgAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    async fn append(&self, entry: &StaffAssignment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO staff_assignments (user_id, company_id, branch_offices, assigned_at, assigned_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.company_id)
        .bind(&entry.branch_offices)
        .bind(entry.assigned_at)
        .bind(&entry.assigned_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_by_company(&self, company_id: &str) -> Result<u64, AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM staff_assignments WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total.max(0) as u64)
    }

    async fn list_by_company(
        &self,
        company_id: &str,
        page: PageRequest,
    ) -> Result<Vec<StaffAssignment>, AppError> {
        let (offset, limit) = page.sql_window();

        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_id, company_id, branch_offices, assigned_at, assigned_by
            FROM staff_assignments
            WHERE company_id = $1
            ORDER BY assigned_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StaffAssignment::from).collect())
    }
}
