//! Transition executor
//!
//! Issues one status-change procedure call per tag, all in flight at once,
//! and collects every outcome. A failed call never cancels the others.

use futures::future::join_all;
use serde_json::{Value, json};
use shared::{TransitionFailure, TransitionMode};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::policy::{TransitionRequest, TransitionTarget};
use crate::remote::RemoteDataService;
use crate::TransitionError;

/// Source tag recorded by the backend for normal bulk changes
pub const BULK_SOURCE_TAG: &str = "bulk_status_update";

/// Source tag recorded by the backend for correction-mode changes
pub const CORRECTION_SOURCE_TAG: &str = "admin_correction";

/// Result of one per-tag call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Success { tag_id: String },
    Failure(TransitionFailure),
}

/// Executes accepted transition requests against the backend
pub struct TransitionExecutor {
    remote: Arc<dyn RemoteDataService>,
    status_procedure: String,
    correction_procedure: String,
    running: AtomicBool,
}

impl std::fmt::Debug for TransitionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionExecutor")
            .field("status_procedure", &self.status_procedure)
            .field("correction_procedure", &self.correction_procedure)
            .field("running", &self.is_running())
            .finish()
    }
}

impl TransitionExecutor {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        status_procedure: impl Into<String>,
        correction_procedure: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            status_procedure: status_procedure.into(),
            correction_procedure: correction_procedure.into(),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the executor for one run; fails with `Busy` if a run is active.
    ///
    /// The claim is released when the permit is dropped.
    pub fn try_acquire(&self) -> Result<ExecutionPermit<'_>, TransitionError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TransitionError::Busy)?;
        Ok(ExecutionPermit { executor: self })
    }

    fn call_for(&self, request: &TransitionRequest, target: &TransitionTarget) -> (&str, Value) {
        match request.mode {
            TransitionMode::Correction => (
                self.correction_procedure.as_str(),
                json!({
                    "p_tag_id": target.tag_id,
                    "p_target_status": request.target.as_str(),
                    "p_source_tag": CORRECTION_SOURCE_TAG,
                    "p_note": request.note,
                }),
            ),
            TransitionMode::Normal => (
                self.status_procedure.as_str(),
                json!({
                    "p_tag_id": target.tag_id,
                    "p_target_status": request.target.as_str(),
                    "p_note": request.note,
                    "p_source_tag": BULK_SOURCE_TAG,
                    // resolved server-side from the session
                    "p_changed_by": Value::Null,
                }),
            ),
        }
    }
}

/// Exclusive right to run one batch on an executor
#[derive(Debug)]
pub struct ExecutionPermit<'a> {
    executor: &'a TransitionExecutor,
}

impl ExecutionPermit<'_> {
    /// Run every per-tag call concurrently and wait for all of them
    pub async fn execute(&self, request: &TransitionRequest) -> Vec<TransitionOutcome> {
        let executor = self.executor;
        tracing::info!(
            target_status = request.target.as_str(),
            mode = ?request.mode,
            count = request.targets.len(),
            "Starting bulk status change"
        );

        let calls = request.targets.iter().map(|target| async move {
            let (procedure, args) = executor.call_for(request, target);
            match executor.remote.call(procedure, args).await {
                Ok(_) => TransitionOutcome::Success {
                    tag_id: target.tag_id.clone(),
                },
                Err(e) => {
                    tracing::warn!(
                        tag_id = %target.tag_id,
                        tag_code = %target.tag_code,
                        error = %e,
                        "Status change failed"
                    );
                    TransitionOutcome::Failure(TransitionFailure {
                        tag_id: target.tag_id.clone(),
                        tag_code: target.tag_code.clone(),
                        message: e.to_string(),
                    })
                }
            }
        });

        join_all(calls).await
    }
}

impl Drop for ExecutionPermit<'_> {
    fn drop(&mut self) {
        self.executor.running.store(false, Ordering::Release);
    }
}
