//! Error types for the query client.

use std::time::Duration;

use queryrun_core::RequestId;
use thiserror::Error;

/// Errors talking to the control plane through `kubectl`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The `kubectl` process could not be started.
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `kubectl` exited with a non-zero status.
    #[error("Command exited with code {code}: stderr: {stderr}, stdout: {stdout}")]
    Exit {
        code: i32,
        stderr: String,
        stdout: String,
    },

    /// `kubectl` did not finish within the command timeout.
    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The transient manifest file could not be written.
    #[error("Failed to write manifest file: {0}")]
    TempFile(#[source] std::io::Error),

    /// The manifest could not be serialized.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Manifest serialization failure.
#[derive(Debug, Error)]
#[error("Failed to serialize manifest: {0}")]
pub struct ManifestError(#[from] pub serde_yaml::Error);

/// Errors decoding the result field of a finished query.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The result field was empty.
    #[error("Result payload is empty")]
    Empty,

    /// The result field is not a JSON object.
    #[error("Malformed result payload ({reason}): {preview}")]
    Malformed { preview: String, reason: String },
}

/// Errors from a full submit, wait, decode, cleanup run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Control plane access failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The finished query carried an unusable payload.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The control plane reported the query as failed.
    #[error("Query {id} failed")]
    Failed { id: RequestId },

    /// The query did not finish before the deadline.
    #[error("Query {id} did not finish within {waited:?}")]
    TimedOut { id: RequestId, waited: Duration },
}

impl WorkflowError {
    /// Returns true if submitting the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TimedOut { .. } | Self::Gateway(GatewayError::Timeout { .. })
        )
    }
}
