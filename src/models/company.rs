// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::extract::empty_string_as_none;

// ---
// 1. Company (o tenant)
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Company {
    pub id: String,
    #[schema(example = "Acme Lending")]
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: Option<String>,
    pub tax_id: String,
    #[schema(example = "llc")]
    pub business_type: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(payload: CreateCompanyPayload, acting_user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: payload.name,
            address: payload.address,
            phone: payload.phone,
            email: payload.email,
            website: payload.website.filter(|w| !w.is_empty()),
            tax_id: payload.tax_id,
            business_type: payload.business_type,
            created_by: acting_user_id.to_string(),
            updated_by: acting_user_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ---
// 2. BranchOffice (filial, sempre presa a uma Company)
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BranchOffice {
    pub id: String,
    pub company_id: String,
    #[schema(example = "Downtown")]
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BranchOffice {
    pub fn new(
        company_id: &str,
        payload: CreateBranchPayload,
        acting_user_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            name: payload.name,
            address: payload.address,
            phone: payload.phone,
            email: payload.email,
            created_by: acting_user_id.to_string(),
            updated_by: acting_user_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ---
// 3. Patches (atualização parcial tipada)
// ---
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub tax_id: Option<String>,
    pub business_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// ---
// 4. Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "is required"))]
    pub phone: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    pub website: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub tax_id: String,
    #[validate(length(min = 1, message = "is required"))]
    pub business_type: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyPayload {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub business_type: Option<String>,
}

impl From<UpdateCompanyPayload> for CompanyPatch {
    fn from(p: UpdateCompanyPayload) -> Self {
        Self {
            name: p.name,
            address: p.address,
            phone: p.phone,
            email: p.email,
            website: p.website,
            tax_id: p.tax_id,
            business_type: p.business_type,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBranchPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "is required"))]
    pub phone: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBranchPayload {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
}

impl From<UpdateBranchPayload> for BranchPatch {
    fn from(p: UpdateBranchPayload) -> Self {
        Self {
            name: p.name,
            address: p.address,
            phone: p.phone,
            email: p.email,
        }
    }
}
