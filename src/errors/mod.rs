//! Centralized error handling for the EPG merger
//!
//! # Error Categories
//!
//! - **Source Errors**: fetching, reading and parsing guide documents
//! - **Schedule Errors**: template timestamps that cannot be expanded
//! - **Configuration Errors**: invalid merge or schedule settings
//!
//! # Usage
//!
//! ```rust
//! use epg_merger::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Schedule Results
pub type ScheduleResult<T> = Result<T, ScheduleError>;
