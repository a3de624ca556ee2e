// src/db/memory.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::{AssignmentRepository, BranchRepository, CompanyRepository, UserFilter, UserRepository},
    models::{
        auth::{ProfilePatch, Role, User},
        company::{BranchOffice, BranchPatch, Company, CompanyPatch},
        staff::StaffAssignment,
    },
};

/// Armazenamento em memória com o mesmo contrato dos repositórios Postgres.
/// Usado em desenvolvimento (sem `DATABASE_URL`) e nos testes.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    companies: RwLock<Vec<Company>>,
    branches: RwLock<Vec<BranchOffice>>,
    assignments: RwLock<Vec<StaffAssignment>>,
}

// Mais recentes primeiro; empates ficam com o último inserido na frente.
fn newest_first<T: Clone>(
    items: &[T],
    keep: impl Fn(&T) -> bool,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut selected: Vec<T> = items.iter().rev().filter(|item| keep(item)).cloned().collect();
    selected.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    selected
}

fn window<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.into_iter().skip(skip).take(limit).collect()
}

fn matches_user(user: &User, filter: &UserFilter) -> bool {
    match filter {
        UserFilter::All => true,
        UserFilter::BranchStaff { company_id, branch_id } => {
            user.roles.contains(&Role::Staff)
                && user.company_id.as_deref() == Some(company_id.as_str())
                && user.branch_offices.iter().any(|b| b == branch_id)
        }
    }
}

fn apply<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_member(
        &self,
        user_id: &str,
        company_id: &str,
        branch_id: &str,
    ) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| {
                u.id == user_id
                    && u.company_id.as_deref() == Some(company_id)
                    && u.branch_offices.iter().any(|b| b == branch_id)
            })
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(AppError::UsernameTaken);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            if patch.full_name.is_some() {
                user.full_name = patch.full_name.clone();
            }
            if patch.bio.is_some() {
                user.bio = patch.bio.clone();
            }
            if patch.avatar.is_some() {
                user.avatar = patch.avatar.clone();
            }
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.password_hash = password_hash.to_string();
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn set_membership(
        &self,
        id: &str,
        company_id: &str,
        branch_offices: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.company_id = Some(company_id.to_string());
            user.branch_offices = branch_offices.to_vec();
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn set_branch_offices(
        &self,
        id: &str,
        branch_offices: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.branch_offices = branch_offices.to_vec();
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| matches_user(u, filter)).count() as u64)
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        let selected =
            newest_first(users.as_slice(), |u| matches_user(u, filter), |u| u.created_at);
        Ok(window(selected, page))
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn insert(&self, company: &Company) -> Result<(), AppError> {
        self.companies.write().await.push(company.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Company>, AppError> {
        let companies = self.companies.read().await;
        Ok(companies.iter().find(|c| c.id == id).cloned())
    }

    async fn update(
        &self,
        id: &str,
        patch: &CompanyPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Company>, AppError> {
        let mut companies = self.companies.write().await;
        Ok(companies.iter_mut().find(|c| c.id == id).map(|company| {
            apply(&mut company.name, &patch.name);
            apply(&mut company.address, &patch.address);
            apply(&mut company.phone, &patch.phone);
            apply(&mut company.email, &patch.email);
            if patch.website.is_some() {
                company.website = patch.website.clone();
            }
            apply(&mut company.tax_id, &patch.tax_id);
            apply(&mut company.business_type, &patch.business_type);
            company.updated_by = updated_by.to_string();
            company.updated_at = now;
            company.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<u64, AppError> {
        let mut companies = self.companies.write().await;
        let before = companies.len();
        companies.retain(|c| c.id != id);
        Ok((before - companies.len()) as u64)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.companies.read().await.len() as u64)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Company>, AppError> {
        let companies = self.companies.read().await;
        let selected = newest_first(companies.as_slice(), |_| true, |c| c.created_at);
        Ok(window(selected, page))
    }
}

#[async_trait]
impl BranchRepository for MemoryStore {
    async fn insert(&self, branch: &BranchOffice) -> Result<(), AppError> {
        self.branches.write().await.push(branch.clone());
        Ok(())
    }

    async fn find(&self, branch_id: &str, company_id: &str) -> Result<Option<BranchOffice>, AppError> {
        let branches = self.branches.read().await;
        Ok(branches
            .iter()
            .find(|b| b.id == branch_id && b.company_id == company_id)
            .cloned())
    }

    async fn update(
        &self,
        branch_id: &str,
        company_id: &str,
        patch: &BranchPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BranchOffice>, AppError> {
        let mut branches = self.branches.write().await;
        Ok(branches
            .iter_mut()
            .find(|b| b.id == branch_id && b.company_id == company_id)
            .map(|branch| {
                apply(&mut branch.name, &patch.name);
                apply(&mut branch.address, &patch.address);
                apply(&mut branch.phone, &patch.phone);
                apply(&mut branch.email, &patch.email);
                branch.updated_by = updated_by.to_string();
                branch.updated_at = now;
                branch.clone()
            }))
    }

    async fn delete(&self, branch_id: &str, company_id: &str) -> Result<u64, AppError> {
        let mut branches = self.branches.write().await;
        let before = branches.len();
        branches.retain(|b| !(b.id == branch_id && b.company_id == company_id));
        Ok((before - branches.len()) as u64)
    }

    async fn count(&self, company_id: &str) -> Result<u64, AppError> {
        let branches = self.branches.read().await;
        Ok(branches.iter().filter(|b| b.company_id == company_id).count() as u64)
    }

    async fn list(&self, company_id: &str, page: PageRequest) -> Result<Vec<BranchOffice>, AppError> {
        let branches = self.branches.read().await;
        let selected = newest_first(
            branches.as_slice(),
            |b| b.company_id == company_id,
            |b| b.created_at,
        );
        Ok(window(selected, page))
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn append(&self, entry: &StaffAssignment) -> Result<(), AppError> {
        self.assignments.write().await.push(entry.clone());
        Ok(())
    }

    async fn count_by_company(&self, company_id: &str) -> Result<u64, AppError> {
        let assignments = self.assignments.read().await;
        Ok(assignments.iter().filter(|a| a.company_id == company_id).count() as u64)
    }

    async fn list_by_company(
        &self,
        company_id: &str,
        page: PageRequest,
    ) -> Result<Vec<StaffAssignment>, AppError> {
        let assignments = self.assignments.read().await;
        let selected = newest_first(
            assignments.as_slice(),
            |a| a.company_id == company_id,
            |a| a.assigned_at,
        );
        Ok(window(selected, page))
    }
}
