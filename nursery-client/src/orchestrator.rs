//! Tag status transition orchestrator
//!
//! Single entry point for the bulk status workflow. The presentation layer
//! renders what this returns and never re-implements the rules.
//!
//! # Request Flow
//!
//! ```text
//! request_transition(target, mode, note)
//!     ├─ 1. Claim executor (Busy if a batch is running)
//!     ├─ 2. Reject empty selection
//!     ├─ 3. Stale check against loaded tags (clears selection on failure)
//!     ├─ 4. Policy: prior statuses / correction note
//!     ├─ 5. Confirmation (normal mode only)
//!     ├─ 6. Concurrent per-tag procedure calls
//!     ├─ 7. Summarize outcomes
//!     └─ 8. On any success: clear selection, reload once, broadcast
//! ```

use async_trait::async_trait;
use shared::{
    TagEvent, TagStatus, TransitionMode, TransitionReport, TreeTag, TreeTagCreate, TreeTagUpdate,
    Zone,
};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

use crate::executor::TransitionExecutor;
use crate::policy::{self, ConfirmationPrompt};
use crate::reconciler::OutcomeReconciler;
use crate::remote::RemoteDataService;
use crate::selection::SelectionSet;
use crate::store::{self, LoadState, TagStore};
use crate::{ClientConfig, StoreResult, TransitionError, TransitionResult};

/// Tag event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Asks the user to confirm a normal-mode bulk change
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmationPrompt) -> bool;
}

/// Confirms everything (scripted use and tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _prompt: &ConfirmationPrompt) -> bool {
        true
    }
}

/// Store and selection of one UI session
#[derive(Debug)]
struct SessionState {
    store: TagStore,
    selection: SelectionSet,
}

pub struct TagStatusOrchestrator {
    remote: Arc<dyn RemoteDataService>,
    zone_table: String,
    state: Mutex<SessionState>,
    executor: TransitionExecutor,
    reconciler: OutcomeReconciler,
    confirmer: Arc<dyn Confirmer>,
    events: broadcast::Sender<TagEvent>,
}

impl std::fmt::Debug for TagStatusOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagStatusOrchestrator")
            .field("executor", &self.executor)
            .field("confirmer", &"<Confirmer>")
            .finish()
    }
}

impl TagStatusOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        config: &ClientConfig,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            zone_table: config.zone_table.clone(),
            state: Mutex::new(SessionState {
                store: TagStore::new(remote.clone(), config.tag_table.clone()),
                selection: SelectionSet::new(),
            }),
            executor: TransitionExecutor::new(
                remote.clone(),
                config.status_procedure.clone(),
                config.correction_procedure.clone(),
            ),
            reconciler: OutcomeReconciler::new(config.notice_dismiss_after),
            confirmer,
            events,
            remote,
        }
    }

    /// Receive "tags changed" events
    pub fn subscribe(&self) -> broadcast::Receiver<TagEvent> {
        self.events.subscribe()
    }

    /// Whether a bulk change is in flight
    pub fn is_busy(&self) -> bool {
        self.executor.is_running()
    }

    /// All zones, for picking one to load
    pub async fn zones(&self) -> StoreResult<Vec<Zone>> {
        store::list_zones(self.remote.as_ref(), &self.zone_table).await
    }

    /// Load a zone's tags; switching zone empties the selection
    pub async fn load_zone(&self, zone_id: &str) -> StoreResult<Vec<TreeTag>> {
        let mut state = self.state.lock().await;
        let SessionState { store, selection } = &mut *state;
        if store.zone_id() != Some(zone_id) {
            selection.clear();
        }
        store.load(zone_id).await.map(<[TreeTag]>::to_vec)
    }

    pub async fn reload(&self) -> StoreResult<Vec<TreeTag>> {
        let mut state = self.state.lock().await;
        state.store.reload().await.map(<[TreeTag]>::to_vec)
    }

    pub async fn tags(&self) -> Vec<TreeTag> {
        self.state.lock().await.store.tags().to_vec()
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.lock().await.store.state().clone()
    }

    pub async fn toggle(&self, id: &str) -> bool {
        self.state.lock().await.selection.toggle(id)
    }

    /// Add one tag to the selection; selecting it again is a no-op
    pub async fn select(&self, id: &str) -> bool {
        self.state.lock().await.selection.select(id)
    }

    /// Select every loaded tag
    pub async fn select_all(&self) {
        let mut state = self.state.lock().await;
        let ids = state.store.ids();
        state.selection.select_all(ids);
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selection.clear();
    }

    /// Snapshot of the current selection
    pub async fn selection(&self) -> SelectionSet {
        self.state.lock().await.selection.clone()
    }

    /// Move every selected tag to `target`
    pub async fn request_transition(
        &self,
        target: TagStatus,
        mode: TransitionMode,
        note: Option<&str>,
    ) -> TransitionResult<TransitionReport> {
        // claimed before the state lock so an overlapping request fails fast
        let permit = self.executor.try_acquire()?;

        let mut state = self.state.lock().await;
        let SessionState { store, selection } = &mut *state;

        if selection.is_empty() {
            return Err(TransitionError::EmptySelection);
        }
        selection.validate_against(&store.ids())?;

        let records: Vec<&TreeTag> = store
            .tags()
            .iter()
            .filter(|t| selection.contains(&t.id))
            .collect();
        let request = policy::evaluate(&records, target, mode, note).inspect_err(|violation| {
            tracing::info!(
                target_status = target.as_str(),
                %violation,
                "Transition rejected by policy"
            );
        })?;

        if let Some(prompt) = &request.confirmation
            && !self.confirmer.confirm(prompt).await
        {
            return Err(TransitionError::Cancelled);
        }

        let outcomes = permit.execute(&request).await;
        let mut report = self.reconciler.summarize(&request, outcomes);
        self.reconciler
            .apply(&mut report, store, selection, &self.events)
            .await;

        Ok(report)
    }

    /// Create tags (one or many) in the loaded zone's table
    pub async fn create_tags(&self, payloads: Vec<TreeTagCreate>) -> StoreResult<Vec<TreeTag>> {
        let mut state = self.state.lock().await;
        let created = state.store.create_batch(payloads).await?;
        self.notify_changed(&state.store, created.iter().map(|t| t.id.clone()).collect());
        Ok(created)
    }

    /// Edit a tag's descriptive fields
    pub async fn update_tag(&self, id: &str, patch: TreeTagUpdate) -> StoreResult<TreeTag> {
        let mut state = self.state.lock().await;
        let tag = state.store.update(id, patch).await?;
        self.notify_changed(&state.store, vec![tag.id.clone()]);
        Ok(tag)
    }

    /// Delete a tag and drop it from the selection
    pub async fn delete_tag(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.store.delete(id).await?;
        state.selection.remove(id);
        self.notify_changed(&state.store, vec![id.to_string()]);
        Ok(())
    }

    fn notify_changed(&self, store: &TagStore, tag_ids: Vec<String>) {
        let _ = self.events.send(TagEvent::TagsChanged {
            zone_id: store.zone_id().unwrap_or_default().to_string(),
            tag_ids,
        });
    }
}
