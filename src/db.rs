pub mod conformidade_repo;
pub use conformidade_repo::{ConformidadeRepository, ConformidadeStore};
pub mod scheduling_repo;
pub use scheduling_repo::{SchedulingRepository, SchedulingStore};
pub mod task_repo;
pub use task_repo::{TaskRepository, TaskStore};
pub mod demand_repo;
pub use demand_repo::{DemandRepository, DemandStore};
pub mod template_repo;
pub use template_repo::{TemplateRepository, TemplateStore};
pub mod profile_repo;
pub use profile_repo::{DirectoryStore, ProfileRepository};
pub mod extraction_repo;
pub use extraction_repo::{ExtractionRepository, ExtractionStore};

#[cfg(test)]
pub mod memory;
