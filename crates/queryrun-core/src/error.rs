//! Core domain errors.

use thiserror::Error;

/// Core domain errors for queryrun.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Region label not recognized.
    #[error("Unknown region: {0}")]
    InvalidRegion(String),

    /// Request identity cannot be used as a resource name.
    #[error("Invalid request id '{id}': {reason}")]
    InvalidRequestId { id: String, reason: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
