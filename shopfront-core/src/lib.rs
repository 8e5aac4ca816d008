//! Shopfront Core - Wire Types
//!
//! Pure data structures shared by the sync layer and the UI. All other
//! crates depend on this. This crate contains ONLY data types and the
//! error taxonomy - no I/O, no business logic.

pub mod entities;
pub mod error;
pub mod friendly;

pub use entities::*;
pub use error::{ApiError, ApiResult};
pub use friendly::to_user_friendly;

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
