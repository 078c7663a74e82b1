//! # Design
//!
//! - Constant error messages; offending values travel as fields.
//! - Only transfer batch construction can fail in this crate.

use thiserror::Error;

/// Result alias for domain model operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced while constructing domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A required field of a transfer batch was empty.
    #[error("invalid transfer batch")]
    InvalidBatch {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
}
