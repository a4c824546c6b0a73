//! Best-effort deletion of finished queries.

use tracing::{debug, warn};

use queryrun_core::RequestId;

use crate::gateway::ResourceGateway;

/// Deletes query resources once their result has been consumed.
pub struct LifecycleCleaner;

impl LifecycleCleaner {
    /// Delete the resource, swallowing any failure.
    ///
    /// Deleting a resource that does not exist counts as success, so calling
    /// this twice, or for a query that was never created, is harmless.
    pub async fn cleanup<G>(gateway: &G, id: &RequestId) -> bool
    where
        G: ResourceGateway + ?Sized,
    {
        let deleted = gateway.delete(id).await;
        if deleted {
            debug!(query = %id, "Query cleaned up");
        } else {
            warn!(query = %id, "Query cleanup failed; the control plane collects it after its ttl");
        }
        deleted
    }
}

/// Runs the cleanup for one query at most once.
pub struct Cleanup<'a, G: ResourceGateway + ?Sized> {
    gateway: &'a G,
    id: RequestId,
    outcome: Option<bool>,
}

impl<'a, G: ResourceGateway + ?Sized> Cleanup<'a, G> {
    /// Arm the cleanup for `id`.
    pub fn new(gateway: &'a G, id: RequestId) -> Self {
        Self {
            gateway,
            id,
            outcome: None,
        }
    }

    /// Delete the query on the first call; later calls return the first outcome.
    pub async fn run(&mut self) -> bool {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        let outcome = LifecycleCleaner::cleanup(self.gateway, &self.id).await;
        self.outcome = Some(outcome);
        outcome
    }
}

impl<G: ResourceGateway + ?Sized> Drop for Cleanup<'_, G> {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            warn!(query = %self.id, "Cleanup dropped before running; query left for ttl collection");
        }
    }
}
