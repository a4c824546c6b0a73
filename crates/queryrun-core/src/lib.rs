//! queryrun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Subprocesses or the administrative CLI
//! - Filesystem access
//! - Runtime specifics
//!
//! All types here describe a query request, the phases the control plane
//! reports for it, and the result payload it eventually produces.

pub mod error;
pub mod ids;
pub mod payload;
pub mod request;
pub mod status;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::RequestId;
pub use payload::{Company, ResultPayload};
pub use request::{resolve_target_name, Region, TargetKind, WorkRequest};
pub use status::{ResourcePhase, WaitOutcome};
