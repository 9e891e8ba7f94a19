pub mod check;
pub mod cli;
pub mod combinator;
pub mod config;
pub mod models;
pub mod probe;
pub mod report;
pub mod retailers;
pub mod runner;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use check::RetailerCheck;
pub use config::AppConfig;
pub use models::{Availability, CheckJob, CheckState, Edition, JobRecord, TriState};
pub use retailers::RetailerRegistry;
pub use runner::JobRunner;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
