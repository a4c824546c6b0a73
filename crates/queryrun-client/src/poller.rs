//! Completion polling for submitted queries.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use queryrun_core::{RequestId, ResourcePhase, WaitOutcome};

use crate::config::ClientConfig;
use crate::gateway::ResourceGateway;

/// Waits for a query to reach a terminal phase.
///
/// The wait is a plain future driven by `tokio::time`; dropping it stops
/// polling, so callers can bound or cancel it with `tokio::select!` or
/// `tokio::time::timeout`.
#[derive(Debug, Clone, Copy)]
pub struct CompletionPoller {
    interval: Duration,
}

impl CompletionPoller {
    /// Create a poller reading the phase once per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create a poller with the configured interval.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.poll_interval)
    }

    /// Poll interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the query is done, failed, or `deadline` has elapsed.
    ///
    /// The first read happens immediately. Failed reads are retried on the
    /// next tick, since the control plane may not have caught up with the
    /// apply yet.
    pub async fn wait_for_terminal<G>(
        &self,
        gateway: &G,
        id: &RequestId,
        deadline: Duration,
    ) -> WaitOutcome
    where
        G: ResourceGateway + ?Sized,
    {
        let start = Instant::now();
        let mut reads = 0u32;
        let mut last_phase = ResourcePhase::Unknown;

        loop {
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                warn!(
                    query = %id,
                    reads,
                    last_phase = %last_phase,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Query did not finish before the deadline"
                );
                return WaitOutcome::TimedOut;
            }

            reads += 1;
            match gateway.read_phase(id).await {
                Ok(ResourcePhase::Done) => {
                    info!(
                        query = %id,
                        reads,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Query done"
                    );
                    return WaitOutcome::Done;
                }
                Ok(ResourcePhase::Error) => {
                    warn!(query = %id, reads, "Query reported an error");
                    return WaitOutcome::Failed;
                }
                Ok(phase) => {
                    if phase != last_phase {
                        debug!(query = %id, phase = %phase, "Query phase changed");
                    }
                    last_phase = phase;
                }
                Err(e) => {
                    debug!(query = %id, error = %e, "Phase read failed, retrying");
                }
            }

            let remaining = deadline.saturating_sub(start.elapsed());
            tokio::time::sleep(self.interval.min(remaining)).await;
        }
    }
}

impl Default for CompletionPoller {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedGateway, Step};
    use queryrun_core::ResourcePhase::{Done, Error, Pending, Running, Unknown};

    const INTERVAL: Duration = Duration::from_secs(2);

    fn id() -> RequestId {
        RequestId::new("office-query")
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_after_three_reads() {
        let gateway = ScriptedGateway::phases([Running, Running, Done]);
        let poller = CompletionPoller::new(INTERVAL);

        let start = Instant::now();
        let outcome = poller
            .wait_for_terminal(&gateway, &id(), Duration::from_secs(300))
            .await;
        let elapsed = start.elapsed();

        assert_eq!(outcome, WaitOutcome::Done);
        assert_eq!(gateway.phase_reads(), 3);
        assert!(elapsed >= INTERVAL * 2);
        assert!(elapsed < INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_never_terminal() {
        let gateway = ScriptedGateway::running();
        let poller = CompletionPoller::new(INTERVAL);

        let start = Instant::now();
        let outcome = poller
            .wait_for_terminal(&gateway, &id(), Duration::from_secs(6))
            .await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(gateway.phase_reads(), 3);
        assert!(start.elapsed() >= Duration::from_secs(6));
        assert!(start.elapsed() < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_phase_fails() {
        let gateway = ScriptedGateway::phases([Pending, Running, Error]);
        let outcome = CompletionPoller::new(INTERVAL)
            .wait_for_terminal(&gateway, &id(), Duration::from_secs(300))
            .await;

        assert_eq!(outcome, WaitOutcome::Failed);
        assert_eq!(gateway.phase_reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_and_unknown_are_retried() {
        let gateway = ScriptedGateway::new([
            Step::ReadError,
            Step::Phase(Unknown),
            Step::ReadError,
            Step::Phase(Done),
        ]);
        let outcome = CompletionPoller::new(INTERVAL)
            .wait_for_terminal(&gateway, &id(), Duration::from_secs(300))
            .await;

        assert_eq!(outcome, WaitOutcome::Done);
        assert_eq!(gateway.phase_reads(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_read_errors_time_out() {
        let gateway = ScriptedGateway::running().with_fallback(Step::ReadError);
        let outcome = CompletionPoller::new(INTERVAL)
            .wait_for_terminal(&gateway, &id(), Duration::from_secs(10))
            .await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(gateway.phase_reads(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_deadline_times_out_without_reading() {
        let gateway = ScriptedGateway::phases([Done]);
        let outcome = CompletionPoller::new(INTERVAL)
            .wait_for_terminal(&gateway, &id(), Duration::ZERO)
            .await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(gateway.phase_reads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_can_be_cancelled_by_caller() {
        let gateway = ScriptedGateway::running();
        let poller = CompletionPoller::new(INTERVAL);

        let id = id();
        let wait = poller.wait_for_terminal(&gateway, &id, Duration::from_secs(300));
        let cancelled = tokio::time::timeout(Duration::from_secs(5), wait).await;

        assert!(cancelled.is_err());
        assert_eq!(gateway.phase_reads(), 3);
    }
}
