use std::sync::Arc;

use sqlx::PgPool;

pub mod assignment_repo;
pub mod branch_repo;
pub mod company_repo;
pub mod memory;
pub mod user_repo;

pub use assignment_repo::{AssignmentRepository, PgAssignmentRepository};
pub use branch_repo::{BranchRepository, PgBranchRepository};
pub use company_repo::{CompanyRepository, PgCompanyRepository};
pub use memory::MemoryStore;
pub use user_repo::{PgUserRepository, UserFilter, UserRepository};

// Conjunto de repositórios que os serviços recebem.
// Cada chamada é atômica sozinha; sequências de chamadas não são.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub branches: Arc<dyn BranchRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            companies: Arc::new(PgCompanyRepository::new(pool.clone())),
            branches: Arc::new(PgBranchRepository::new(pool.clone())),
            assignments: Arc::new(PgAssignmentRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            users: store.clone(),
            companies: store.clone(),
            branches: store.clone(),
            assignments: store,
        }
    }
}
