//! Shared types for the point-of-sale backend
//!
//! Domain models, the unified error system and small utilities used by the
//! order engine and by whatever transport layer fronts it.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
