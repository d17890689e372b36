// ==========================================
// Plant operations - API layer
// ==========================================
// Validates requests, calls repositories and engines,
// returns serialisable responses
// ==========================================

pub mod batch_api;
pub mod error;

pub use batch_api::BatchTracker;
pub use error::{ApiError, ApiResult};
