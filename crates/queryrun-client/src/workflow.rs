//! End-to-end query workflow: submit, wait, decode, clean up.

use std::time::Duration;

use tracing::{info, warn};

use queryrun_core::{RequestId, ResourcePhase, ResultPayload, WaitOutcome, WorkRequest};

use crate::cleaner::{Cleanup, LifecycleCleaner};
use crate::config::ClientConfig;
use crate::decoder::decode;
use crate::error::{GatewayError, WorkflowError};
use crate::gateway::{ListKind, ResourceGateway};
use crate::manifest::{build_manifest, ResourceManifest};
use crate::poller::CompletionPoller;

/// Query client.
///
/// Holds no per-request state; one client can serve any number of concurrent
/// requests, each scoped by its own request id.
pub struct QueryClient<G: ResourceGateway> {
    gateway: G,
    config: ClientConfig,
    poller: CompletionPoller,
}

impl<G: ResourceGateway> QueryClient<G> {
    /// Create a client over `gateway`.
    pub fn new(gateway: G, config: ClientConfig) -> Self {
        let poller = CompletionPoller::from_config(&config);
        Self {
            gateway,
            config,
            poller,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Manifest that would be submitted for `request`.
    pub fn manifest(&self, request: &WorkRequest) -> ResourceManifest {
        build_manifest(request, &self.config.namespace)
    }

    /// Run a request with the configured deadline.
    pub async fn run(&self, request: &WorkRequest) -> Result<ResultPayload, WorkflowError> {
        self.run_with_deadline(request, self.config.deadline).await
    }

    /// Submit `request`, wait up to `deadline`, decode the result, and delete
    /// the query.
    ///
    /// Once submission has been attempted the query is deleted exactly once,
    /// whatever the outcome; a failed deletion is logged and never replaces
    /// the primary result.
    pub async fn run_with_deadline(
        &self,
        request: &WorkRequest,
        deadline: Duration,
    ) -> Result<ResultPayload, WorkflowError> {
        let manifest = self.manifest(request);
        info!(
            query = %request.id,
            executor = %request.target_name(),
            kind = %request.target_kind,
            region = %request.region,
            "Submitting query"
        );

        let mut cleanup = Cleanup::new(&self.gateway, request.id.clone());

        let id = match self.gateway.create(&manifest).await {
            Ok(id) => id,
            Err(e) => {
                warn!(query = %request.id, error = %e, "Query submission failed");
                cleanup.run().await;
                return Err(e.into());
            }
        };

        let result = self.collect(&id, deadline).await;
        cleanup.run().await;

        match &result {
            Ok(payload) => info!(
                query = %id,
                fields = payload.len(),
                companies = payload.companies().len(),
                "Query finished"
            ),
            Err(e) => warn!(query = %id, error = %e, "Query finished without a result"),
        }
        result
    }

    /// Wait for the query and decode its result.
    async fn collect(
        &self,
        id: &RequestId,
        deadline: Duration,
    ) -> Result<ResultPayload, WorkflowError> {
        match self.wait(id, deadline).await {
            WaitOutcome::Done => self.results(id).await,
            WaitOutcome::Failed => Err(WorkflowError::Failed { id: id.clone() }),
            WaitOutcome::TimedOut => Err(WorkflowError::TimedOut {
                id: id.clone(),
                waited: deadline,
            }),
        }
    }

    /// Submit a request without waiting for it.
    pub async fn submit(&self, request: &WorkRequest) -> Result<RequestId, GatewayError> {
        self.gateway.create(&self.manifest(request)).await
    }

    /// Current phase of a query.
    pub async fn status(&self, id: &RequestId) -> Result<ResourcePhase, GatewayError> {
        self.gateway.read_phase(id).await
    }

    /// Wait for a query to reach a terminal phase.
    pub async fn wait(&self, id: &RequestId, deadline: Duration) -> WaitOutcome {
        self.poller
            .wait_for_terminal(&self.gateway, id, deadline)
            .await
    }

    /// Read and decode the result of a finished query.
    pub async fn results(&self, id: &RequestId) -> Result<ResultPayload, WorkflowError> {
        let raw = self.gateway.read_result_field(id).await?;
        Ok(decode(&raw)?)
    }

    /// Delete a query, ignoring absence.
    pub async fn delete(&self, id: &RequestId) -> bool {
        LifecycleCleaner::cleanup(&self.gateway, id).await
    }

    /// Names of the agents known to the control plane.
    pub async fn available_agents(&self) -> Result<Vec<String>, GatewayError> {
        self.gateway.list_names(ListKind::Agents).await
    }

    /// Names of the tools known to the control plane.
    pub async fn available_tools(&self) -> Result<Vec<String>, GatewayError> {
        self.gateway.list_names(ListKind::Tools).await
    }
}
