pub mod communities;
pub mod error;
pub mod insights;
pub mod users;

pub use error::{ApiError, ApiResult};
