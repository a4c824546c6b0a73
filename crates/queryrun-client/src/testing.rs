//! In-memory gateway for tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use queryrun_core::{RequestId, ResourcePhase};

use crate::error::GatewayError;
use crate::gateway::{ListKind, ResourceGateway};
use crate::manifest::ResourceManifest;

/// One scripted answer to a phase read.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Phase(ResourcePhase),
    ReadError,
}

/// Gateway that replays scripted phases and records every call.
pub struct ScriptedGateway {
    steps: Mutex<VecDeque<Step>>,
    /// Answer once the script is exhausted.
    fallback: Step,
    result_field: Option<String>,
    create_fails: bool,
    delete_succeeds: bool,
    live: Mutex<HashSet<String>>,
    pub created: Mutex<Vec<ResourceManifest>>,
    pub phase_reads: AtomicUsize,
    pub result_reads: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            fallback: Step::Phase(ResourcePhase::Running),
            result_field: Some(String::new()),
            create_fails: false,
            delete_succeeds: true,
            live: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
            phase_reads: AtomicUsize::new(0),
            result_reads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Never leaves `Running`.
    pub fn running() -> Self {
        Self::new(Vec::<Step>::new())
    }

    pub fn phases(phases: impl IntoIterator<Item = ResourcePhase>) -> Self {
        Self::new(phases.into_iter().map(Step::Phase))
    }

    pub fn with_fallback(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }

    pub fn with_result(mut self, raw: &str) -> Self {
        self.result_field = Some(raw.to_string());
        self
    }

    pub fn with_result_read_error(mut self) -> Self {
        self.result_field = None;
        self
    }

    pub fn with_create_failure(mut self) -> Self {
        self.create_fails = true;
        self
    }

    pub fn with_delete_failure(mut self) -> Self {
        self.delete_succeeds = false;
        self
    }

    pub fn phase_reads(&self) -> usize {
        self.phase_reads.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.live.lock().unwrap().contains(id)
    }

    fn exit_error(message: &str) -> GatewayError {
        GatewayError::Exit {
            code: 1,
            stderr: message.to_string(),
            stdout: String::new(),
        }
    }
}

#[async_trait]
impl ResourceGateway for ScriptedGateway {
    async fn create(&self, manifest: &ResourceManifest) -> Result<RequestId, GatewayError> {
        self.created.lock().unwrap().push(manifest.clone());
        if self.create_fails {
            return Err(Self::exit_error("apply rejected"));
        }
        self.live.lock().unwrap().insert(manifest.name().to_string());
        Ok(RequestId::new(manifest.name()))
    }

    async fn read_phase(&self, _id: &RequestId) -> Result<ResourcePhase, GatewayError> {
        self.phase_reads.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        match step {
            Step::Phase(phase) => Ok(phase),
            Step::ReadError => Err(Self::exit_error("connection refused")),
        }
    }

    async fn read_result_field(&self, _id: &RequestId) -> Result<String, GatewayError> {
        self.result_reads.fetch_add(1, Ordering::SeqCst);
        self.result_field
            .clone()
            .ok_or_else(|| Self::exit_error("connection refused"))
    }

    async fn delete(&self, id: &RequestId) -> bool {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.delete_succeeds {
            self.live.lock().unwrap().remove(id.as_str());
        }
        self.delete_succeeds
    }

    async fn list_names(&self, kind: ListKind) -> Result<Vec<String>, GatewayError> {
        Ok(match kind {
            ListKind::Agents => vec!["company-finder".to_string()],
            ListKind::Tools => Vec::new(),
        })
    }
}
