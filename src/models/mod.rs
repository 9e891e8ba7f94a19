pub mod job;
pub mod retailer;
pub mod tri_state;
pub mod validator;

// Re-exports for convenience
pub use job::*;
pub use retailer::*;
pub use tri_state::*;
pub use validator::*;
