// src/models/staff.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Entrada do histórico (ledger) de atribuições. Não é o vínculo vivo:
// esse fica em `User.company_id` / `User.branch_offices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StaffAssignment {
    pub user_id: String,
    pub company_id: String,
    pub branch_offices: Vec<String>,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignStaffPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub user_id: String,

    // Quando omitido, vale a filial da rota
    pub branch_offices: Option<Vec<String>>,
}
