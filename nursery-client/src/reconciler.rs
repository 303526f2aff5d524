//! Outcome reconciler
//!
//! Turns executor outcomes into a [`TransitionReport`] and, when anything
//! succeeded, clears the selection, reloads the store once and announces the
//! change to subscribers.

use shared::{
    Notice, NoticeTarget, ReportKind, TagEvent, TagStatus, TransitionFailure, TransitionReport,
};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::executor::TransitionOutcome;
use crate::policy::TransitionRequest;
use crate::selection::SelectionSet;
use crate::store::TagStore;

/// Failure messages copied into the report
const MAX_SAMPLED_ERRORS: usize = 3;

#[derive(Debug, Clone)]
pub struct OutcomeReconciler {
    notice_dismiss_after: Duration,
}

impl OutcomeReconciler {
    pub fn new(notice_dismiss_after: Duration) -> Self {
        Self {
            notice_dismiss_after,
        }
    }

    /// Build the report for a finished batch
    pub fn summarize(
        &self,
        request: &TransitionRequest,
        outcomes: Vec<TransitionOutcome>,
    ) -> TransitionReport {
        let mut succeeded = Vec::new();
        let mut failed: Vec<TransitionFailure> = Vec::new();
        for outcome in outcomes {
            match outcome {
                TransitionOutcome::Success { tag_id } => succeeded.push(tag_id),
                TransitionOutcome::Failure(failure) => failed.push(failure),
            }
        }

        let sampled_errors: Vec<String> = failed
            .iter()
            .take(MAX_SAMPLED_ERRORS)
            .map(|f| format!("{}: {}", f.tag_code, f.message))
            .collect();

        let (kind, message) = match (succeeded.len(), failed.len()) {
            (ok, 0) => (
                ReportKind::FullSuccess,
                format!("Updated {} {} to {}", ok, plural(ok), request.target.label()),
            ),
            (0, err) => (
                ReportKind::TotalFailure,
                format!("No tags updated: 0 succeeded, {} failed", err),
            ),
            (ok, err) => (
                ReportKind::PartialSuccess,
                format!("{} succeeded, {} failed", ok, err),
            ),
        };

        let notice = (kind == ReportKind::FullSuccess
            && request.target.canonical() == TagStatus::ReadyForSale)
            .then(|| Notice {
                message: format!(
                    "{} {} ready for sale. Open the stock view to list them.",
                    succeeded.len(),
                    if succeeded.len() == 1 { "tag is" } else { "tags are" }
                ),
                target: NoticeTarget::StockView,
                dismiss_after: self.notice_dismiss_after,
            });

        match kind {
            ReportKind::FullSuccess => tracing::info!(succeeded = succeeded.len(), "{}", message),
            _ => tracing::warn!(
                succeeded = succeeded.len(),
                failed = failed.len(),
                "{}",
                message
            ),
        }

        TransitionReport {
            target: request.target,
            mode: request.mode,
            kind,
            succeeded,
            failed,
            message,
            sampled_errors,
            notice,
            reload_error: None,
        }
    }

    /// Apply the report to local state.
    ///
    /// With zero successes nothing is touched, so the user can retry the
    /// same selection.
    pub async fn apply(
        &self,
        report: &mut TransitionReport,
        store: &mut TagStore,
        selection: &mut SelectionSet,
        events: &broadcast::Sender<TagEvent>,
    ) {
        if report.succeeded.is_empty() {
            return;
        }

        selection.clear();

        if let Err(e) = store.reload().await {
            report.reload_error = Some(e.to_string());
        }

        let event = TagEvent::TagsChanged {
            zone_id: store.zone_id().unwrap_or_default().to_string(),
            tag_ids: report.succeeded.clone(),
        };
        // no subscribers is fine
        let _ = events.send(event);
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "tag" } else { "tags" }
}
