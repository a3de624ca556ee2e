// src/services/company_service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::CompanyRepository,
    models::company::{Company, CompanyPatch, CreateCompanyPayload},
};

#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompanyRepository>,
}

impl CompanyService {
    pub fn new(companies: Arc<dyn CompanyRepository>) -> Self {
        Self { companies }
    }

    pub async fn create_company(
        &self,
        payload: CreateCompanyPayload,
        acting_user_id: &str,
    ) -> Result<Company, AppError> {
        let company = Company::new(payload, acting_user_id, Utc::now());
        self.companies.insert(&company).await?;

        tracing::info!(company_id = %company.id, created_by = acting_user_id, "Empresa criada");
        Ok(company)
    }

    pub async fn get_company(&self, company_id: &str) -> Result<Company, AppError> {
        self.companies
            .find_by_id(company_id)
            .await?
            .ok_or(AppError::CompanyNotFound)
    }

    pub async fn update_company(
        &self,
        company_id: &str,
        patch: CompanyPatch,
        acting_user_id: &str,
    ) -> Result<Company, AppError> {
        self.companies
            .update(company_id, &patch, acting_user_id, Utc::now())
            .await?
            .ok_or(AppError::CompanyNotFound)
    }

    // Filiais e vínculos de staff ficam como estão
    pub async fn delete_company(&self, company_id: &str) -> Result<(), AppError> {
        if self.companies.delete(company_id).await? == 0 {
            return Err(AppError::CompanyNotFound);
        }
        tracing::info!(company_id, "Empresa removida");
        Ok(())
    }

    pub async fn list_companies(&self, page: PageRequest) -> Result<Paginated<Company>, AppError> {
        let total = self.companies.count().await?;
        let companies = self.companies.list(page).await?;
        Ok(Paginated::new(companies, total, page))
    }
}
