pub mod resource;
pub use resource::Resource;
pub mod record_repo;
pub use record_repo::{RecordRepository, RowLock};
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
