// src/services/tenancy_service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{AssignmentRepository, BranchRepository, CompanyRepository, Repositories, UserFilter, UserRepository},
    models::{
        auth::{AuthResponse, RegisterUserPayload, Role, User},
        company::{BranchOffice, BranchPatch, Company, CreateBranchPayload},
        staff::StaffAssignment,
    },
    services::auth::{AuthService, NewAccount},
};

/// Filiais e vínculo de staff. Toda operação de filial é escopada pela empresa.
#[derive(Clone)]
pub struct TenancyService {
    users: Arc<dyn UserRepository>,
    companies: Arc<dyn CompanyRepository>,
    branches: Arc<dyn BranchRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    auth: AuthService,
}

impl TenancyService {
    pub fn new(repos: &Repositories, auth: AuthService) -> Self {
        Self {
            users: repos.users.clone(),
            companies: repos.companies.clone(),
            branches: repos.branches.clone(),
            assignments: repos.assignments.clone(),
            auth,
        }
    }

    async fn require_company(&self, company_id: &str) -> Result<Company, AppError> {
        self.companies
            .find_by_id(company_id)
            .await?
            .ok_or(AppError::CompanyNotFound)
    }

    // Checa uma a uma, na ordem dada; a primeira ausente interrompe tudo
    async fn require_branches(&self, company_id: &str, branch_ids: &[String]) -> Result<(), AppError> {
        for branch_id in branch_ids {
            if self.branches.find(branch_id, company_id).await?.is_none() {
                return Err(AppError::InvalidBranch(branch_id.clone()));
            }
        }
        Ok(())
    }

    // ---
    // Filiais
    // ---

    pub async fn create_branch(
        &self,
        company_id: &str,
        payload: CreateBranchPayload,
        acting_user_id: &str,
    ) -> Result<BranchOffice, AppError> {
        self.require_company(company_id).await?;

        let branch = BranchOffice::new(company_id, payload, acting_user_id, Utc::now());
        self.branches.insert(&branch).await?;

        tracing::info!(company_id, branch_id = %branch.id, "Filial criada");
        Ok(branch)
    }

    pub async fn get_branch(&self, company_id: &str, branch_id: &str) -> Result<BranchOffice, AppError> {
        self.branches
            .find(branch_id, company_id)
            .await?
            .ok_or(AppError::BranchNotFound)
    }

    pub async fn update_branch(
        &self,
        company_id: &str,
        branch_id: &str,
        patch: BranchPatch,
        acting_user_id: &str,
    ) -> Result<BranchOffice, AppError> {
        self.branches
            .update(branch_id, company_id, &patch, acting_user_id, Utc::now())
            .await?
            .ok_or(AppError::BranchNotFound)
    }

    pub async fn delete_branch(&self, company_id: &str, branch_id: &str) -> Result<(), AppError> {
        if self.branches.delete(branch_id, company_id).await? == 0 {
            return Err(AppError::BranchNotFound);
        }
        tracing::info!(company_id, branch_id, "Filial removida");
        Ok(())
    }

    // Empresa inexistente devolve página vazia, não 404
    pub async fn list_branches(
        &self,
        company_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<BranchOffice>, AppError> {
        let total = self.branches.count(company_id).await?;
        let branches = self.branches.list(company_id, page).await?;
        Ok(Paginated::new(branches, total, page))
    }

    // ---
    // Staff
    // ---

    /// Sobrescreve o vínculo do staff (empresa + filiais) e registra no ledger.
    ///
    /// As duas escritas não são atômicas: se o ledger falhar, o vínculo
    /// já foi gravado e o erro sobe mesmo assim.
    pub async fn assign_staff(
        &self,
        company_id: &str,
        user_id: &str,
        branch_ids: Vec<String>,
        acting_user_id: &str,
    ) -> Result<User, AppError> {
        // 1. Usuário existe e é staff
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        if !user.is_staff() {
            return Err(AppError::NotStaff);
        }

        // 2. Empresa e filiais
        self.require_company(company_id).await?;
        self.require_branches(company_id, &branch_ids).await?;

        // 3. Vínculo vivo
        let now = Utc::now();
        let updated = self
            .users
            .set_membership(user_id, company_id, &branch_ids, now)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // 4. Ledger
        let entry = StaffAssignment {
            user_id: user_id.to_string(),
            company_id: company_id.to_string(),
            branch_offices: branch_ids,
            assigned_at: now,
            assigned_by: acting_user_id.to_string(),
        };
        if let Err(err) = self.assignments.append(&entry).await {
            tracing::error!(user_id, company_id, error = %err, "Vínculo gravado mas histórico não");
            return Err(err);
        }

        tracing::info!(user_id, company_id, branches = ?entry.branch_offices, "Staff atribuído");
        Ok(updated)
    }

    pub async fn remove_staff_from_branch(
        &self,
        company_id: &str,
        branch_id: &str,
        user_id: &str,
    ) -> Result<User, AppError> {
        let member = self
            .users
            .find_member(user_id, company_id, branch_id)
            .await?
            .ok_or(AppError::StaffNotFound)?;

        let remaining: Vec<String> = member
            .branch_offices
            .into_iter()
            .filter(|id| id != branch_id)
            .collect();

        let updated = self
            .users
            .set_branch_offices(user_id, &remaining, Utc::now())
            .await?
            .ok_or(AppError::StaffNotFound)?;

        tracing::info!(user_id, company_id, branch_id, "Staff removido da filial");
        Ok(updated)
    }

    pub async fn list_branch_staff(
        &self,
        company_id: &str,
        branch_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<User>, AppError> {
        self.get_branch(company_id, branch_id).await?;

        let filter = UserFilter::BranchStaff {
            company_id: company_id.to_string(),
            branch_id: branch_id.to_string(),
        };
        let total = self.users.count(&filter).await?;
        let staff = self.users.list(&filter, page).await?;
        Ok(Paginated::new(staff, total, page))
    }

    pub async fn list_assignments(
        &self,
        company_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<StaffAssignment>, AppError> {
        self.require_company(company_id).await?;

        let total = self.assignments.count_by_company(company_id).await?;
        let entries = self.assignments.list_by_company(company_id, page).await?;
        Ok(Paginated::new(entries, total, page))
    }

    /// Registro de staff: o papel `staff` é sempre incluído e empresa/filiais,
    /// quando informadas, precisam existir antes da conta ser criada.
    pub async fn register_staff(&self, payload: RegisterUserPayload) -> Result<AuthResponse, AppError> {
        let mut roles = payload.roles;
        if !roles.contains(&Role::Staff) {
            roles.push(Role::Staff);
        }

        let company_id = payload.company_id.filter(|id| !id.is_empty());
        match &company_id {
            Some(company_id) => {
                self.require_company(company_id).await?;
                self.require_branches(company_id, &payload.branch_offices).await?;
            }
            None if !payload.branch_offices.is_empty() => {
                return Err(AppError::BranchesWithoutCompany);
            }
            None => {}
        }

        self.auth
            .create_account(NewAccount {
                username: payload.username,
                password: payload.password,
                full_name: payload.full_name,
                roles,
                company_id,
                branch_offices: payload.branch_offices,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        db::MemoryStore,
        models::company::CreateCompanyPayload,
        services::{credentials::PasswordHasher, token::TokenCodec},
    };

    struct BrokenLedger;

    #[async_trait]
    impl AssignmentRepository for BrokenLedger {
        async fn append(&self, _entry: &StaffAssignment) -> Result<(), AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("ledger offline")))
        }

        async fn count_by_company(&self, _company_id: &str) -> Result<u64, AppError> {
            Ok(0)
        }

        async fn list_by_company(
            &self,
            _company_id: &str,
            _page: PageRequest,
        ) -> Result<Vec<StaffAssignment>, AppError> {
            Ok(Vec::new())
        }
    }

    struct Fixture {
        service: TenancyService,
        company: Company,
        b1: BranchOffice,
        b3: BranchOffice,
    }

    fn service_over(repos: &Repositories) -> TenancyService {
        let auth = AuthService::new(
            repos.users.clone(),
            PasswordHasher::new(4),
            Arc::new(TokenCodec::new("unit-test-secret")),
        );
        TenancyService::new(repos, auth)
    }

    fn branch_payload(name: &str) -> CreateBranchPayload {
        CreateBranchPayload {
            name: name.to_string(),
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            email: "branch@acme.test".to_string(),
        }
    }

    async fn fixture(repos: Repositories) -> Fixture {
        let company = Company::new(
            CreateCompanyPayload {
                name: "Acme".to_string(),
                address: "1 Main St".to_string(),
                phone: "555-0100".to_string(),
                email: "ops@acme.test".to_string(),
                website: None,
                tax_id: "12-3456789".to_string(),
                business_type: "llc".to_string(),
            },
            "admin",
            Utc::now(),
        );
        repos.companies.insert(&company).await.unwrap();

        let service = service_over(&repos);
        let b1 = service.create_branch(&company.id, branch_payload("B1"), "admin").await.unwrap();
        let b3 = service.create_branch(&company.id, branch_payload("B3"), "admin").await.unwrap();

        Fixture { service, company, b1, b3 }
    }

    fn staff_payload(username: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            username: username.to_string(),
            password: "secret1".to_string(),
            full_name: None,
            roles: Vec::new(),
            company_id: None,
            branch_offices: Vec::new(),
        }
    }

    #[tokio::test]
    async fn register_staff_always_has_staff_role() {
        let fx = fixture(Repositories::in_memory()).await;
        let mut payload = staff_payload("sam");
        payload.roles = vec![Role::Admin];

        let user = fx.service.register_staff(payload).await.unwrap().user;
        assert_eq!(user.roles, vec![Role::Admin, Role::Staff]);
        assert!(user.company_id.is_none());
    }

    #[tokio::test]
    async fn register_staff_rejects_branches_without_company() {
        let fx = fixture(Repositories::in_memory()).await;
        let mut payload = staff_payload("sam");
        payload.branch_offices = vec![fx.b1.id.clone()];

        let err = fx.service.register_staff(payload).await.unwrap_err();
        assert!(matches!(err, AppError::BranchesWithoutCompany));
    }

    #[tokio::test]
    async fn register_staff_validates_every_branch() {
        let fx = fixture(Repositories::in_memory()).await;
        let mut payload = staff_payload("sam");
        payload.company_id = Some(fx.company.id.clone());
        payload.branch_offices = vec![fx.b1.id.clone(), "B2".to_string()];

        let err = fx.service.register_staff(payload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidBranch(ref id) if id == "B2"));
    }

    #[tokio::test]
    async fn assign_requires_staff_role() {
        let repos = Repositories::in_memory();
        let fx = fixture(repos.clone()).await;
        let plain = User::new("pat".into(), "hash".into(), vec![Role::User], Utc::now());
        repos.users.insert(&plain).await.unwrap();

        let err = fx
            .service
            .assign_staff(&fx.company.id, &plain.id, vec![fx.b1.id.clone()], "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotStaff));
    }

    #[tokio::test]
    async fn invalid_branch_leaves_membership_untouched() {
        let repos = Repositories::in_memory();
        let fx = fixture(repos.clone()).await;
        let staff = fx.service.register_staff(staff_payload("sam")).await.unwrap().user;

        let err = fx
            .service
            .assign_staff(
                &fx.company.id,
                &staff.id,
                vec![fx.b1.id.clone(), "B2".to_string(), fx.b3.id.clone()],
                "admin",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidBranch(ref id) if id == "B2"));

        let stored = repos.users.find_by_id(&staff.id).await.unwrap().unwrap();
        assert!(stored.company_id.is_none());
        assert!(stored.branch_offices.is_empty());
        assert_eq!(repos.assignments.count_by_company(&fx.company.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn assignment_overwrites_and_appends_ledger() {
        let repos = Repositories::in_memory();
        let fx = fixture(repos.clone()).await;
        let staff = fx.service.register_staff(staff_payload("sam")).await.unwrap().user;

        fx.service
            .assign_staff(&fx.company.id, &staff.id, vec![fx.b1.id.clone()], "admin")
            .await
            .unwrap();
        let updated = fx
            .service
            .assign_staff(&fx.company.id, &staff.id, vec![fx.b3.id.clone()], "admin")
            .await
            .unwrap();

        assert_eq!(updated.company_id.as_deref(), Some(fx.company.id.as_str()));
        assert_eq!(updated.branch_offices, vec![fx.b3.id.clone()]);

        let ledger = fx
            .service
            .list_assignments(&fx.company.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(ledger.pagination.total, 2);
        assert_eq!(ledger.data[0].branch_offices, vec![fx.b3.id.clone()]);
        assert_eq!(ledger.data[0].assigned_by, "admin");
    }

    #[tokio::test]
    async fn ledger_failure_keeps_membership_written() {
        let store = Arc::new(MemoryStore::default());
        let repos = Repositories {
            users: store.clone(),
            companies: store.clone(),
            branches: store,
            assignments: Arc::new(BrokenLedger),
        };
        let fx = fixture(repos.clone()).await;
        let staff = fx.service.register_staff(staff_payload("sam")).await.unwrap().user;

        let err = fx
            .service
            .assign_staff(&fx.company.id, &staff.id, vec![fx.b1.id.clone()], "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));

        let stored = repos.users.find_by_id(&staff.id).await.unwrap().unwrap();
        assert_eq!(stored.branch_offices, vec![fx.b1.id.clone()]);
    }

    #[tokio::test]
    async fn removal_drops_only_that_branch() {
        let fx = fixture(Repositories::in_memory()).await;
        let staff = fx.service.register_staff(staff_payload("sam")).await.unwrap().user;
        fx.service
            .assign_staff(
                &fx.company.id,
                &staff.id,
                vec![fx.b1.id.clone(), fx.b3.id.clone()],
                "admin",
            )
            .await
            .unwrap();

        let updated = fx
            .service
            .remove_staff_from_branch(&fx.company.id, &fx.b1.id, &staff.id)
            .await
            .unwrap();
        assert_eq!(updated.branch_offices, vec![fx.b3.id.clone()]);
        assert_eq!(updated.company_id.as_deref(), Some(fx.company.id.as_str()));

        let again = fx
            .service
            .remove_staff_from_branch(&fx.company.id, &fx.b1.id, &staff.id)
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::StaffNotFound));
    }

    #[tokio::test]
    async fn branch_staff_listing_requires_the_branch() {
        let fx = fixture(Repositories::in_memory()).await;
        let staff = fx.service.register_staff(staff_payload("sam")).await.unwrap().user;
        fx.service
            .assign_staff(&fx.company.id, &staff.id, vec![fx.b1.id.clone()], "admin")
            .await
            .unwrap();

        let listed = fx
            .service
            .list_branch_staff(&fx.company.id, &fx.b1.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(listed.pagination.total, 1);
        assert_eq!(listed.data[0].id, staff.id);

        let empty = fx
            .service
            .list_branch_staff(&fx.company.id, &fx.b3.id, PageRequest::default())
            .await
            .unwrap();
        assert!(empty.data.is_empty());

        let err = fx
            .service
            .list_branch_staff(&fx.company.id, "nope", PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BranchNotFound));
    }

    #[tokio::test]
    async fn branches_of_other_companies_are_invisible() {
        let fx = fixture(Repositories::in_memory()).await;

        let err = fx.service.get_branch("other-company", &fx.b1.id).await.unwrap_err();
        assert!(matches!(err, AppError::BranchNotFound));

        let err = fx.service.delete_branch("other-company", &fx.b1.id).await.unwrap_err();
        assert!(matches!(err, AppError::BranchNotFound));
        assert!(fx.service.get_branch(&fx.company.id, &fx.b1.id).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_assignments_leave_one_consistent_winner() {
        let fx = fixture(Repositories::in_memory()).await;
        let staff = fx.service.register_staff(staff_payload("sam")).await.unwrap().user;

        let (first, second) = tokio::join!(
            fx.service
                .assign_staff(&fx.company.id, &staff.id, vec![fx.b1.id.clone()], "admin"),
            fx.service
                .assign_staff(&fx.company.id, &staff.id, vec![fx.b3.id.clone()], "admin"),
        );
        assert!(first.is_ok() && second.is_ok());

        let stored = fx.service.users.find_by_id(&staff.id).await.unwrap().unwrap();
        assert!(
            stored.branch_offices == vec![fx.b1.id.clone()]
                || stored.branch_offices == vec![fx.b3.id.clone()]
        );
        let ledger = fx
            .service
            .list_assignments(&fx.company.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(ledger.pagination.total, 2);
    }
}
