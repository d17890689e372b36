// ==========================================
// Plant operations - repository layer
// ==========================================
// Data access only: parameterised SQL, no business rules
// ==========================================

pub mod batch_repo;
pub mod error;

pub use batch_repo::BatchRepository;
pub use error::{RepositoryError, RepositoryResult};
