//! scholarwatch-common: Shared types, errors, and the HTTP client used across all scholarwatch crates.

pub mod error;
pub mod models;
pub mod sandbox;

// Re-export commonly used types
pub use error::{Result, WatchError};
pub use models::{Article, ArticleSummary, DailyDigest, LiteratureReview};
