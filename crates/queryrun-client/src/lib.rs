//! Query client for queryrun
//!
//! This crate submits a [`WorkRequest`](queryrun_core::WorkRequest) to the
//! control plane as a `Query` resource, waits for it to finish, decodes the
//! result and deletes the resource again. All control plane access goes
//! through `kubectl`, run as a subprocess.
//!
//! # Example
//!
//! ```rust,no_run
//! use queryrun_client::{ClientConfig, KubectlGateway, QueryClient};
//! use queryrun_core::{Region, WorkRequest};
//!
//! async fn find_companies() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default().with_namespace("default");
//!     let client = QueryClient::new(KubectlGateway::new(&config), config);
//!
//!     let request = WorkRequest::describe("Build a 2-floor office", Region::Morocco)?;
//!     let payload = client.run(&request).await?;
//!
//!     for company in payload.companies() {
//!         println!("{} ({:?}/10)", company.name, company.rating);
//!     }
//!     Ok(())
//! }
//! ```

mod cleaner;
mod config;
mod decoder;
mod error;
mod gateway;
mod manifest;
mod poller;
mod workflow;

#[cfg(test)]
mod testing;

// Re-export main types
pub use cleaner::{Cleanup, LifecycleCleaner};
pub use config::ClientConfig;
pub use decoder::{decode, PREVIEW_LEN};
pub use error::{DecodeError, GatewayError, ManifestError, WorkflowError};
pub use gateway::{KubectlGateway, ListKind, ResourceGateway};
pub use manifest::{
    build_manifest, ManifestMetadata, ManifestSpec, ManifestTarget, ResourceManifest, API_VERSION,
    KIND,
};
pub use poller::CompletionPoller;
pub use workflow::QueryClient;
