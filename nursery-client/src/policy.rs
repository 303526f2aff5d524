//! Transition policy
//!
//! Pure admissibility check run before any remote call. It mirrors the
//! backend's status rules so obviously invalid batches never leave the
//! client; the backend still enforces them independently.

use shared::{PolicyViolation, StatusOffender, TagStatus, TransitionMode, TreeTag};

/// Offenders listed by name in a violation
const MAX_LISTED_OFFENDERS: usize = 3;

/// One tag to transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTarget {
    pub tag_id: String,
    pub tag_code: String,
}

/// Confirmation the user must accept before a normal-mode run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub count: usize,
    pub target: TagStatus,
    pub message: String,
}

/// An accepted bulk transition, ready for the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub target: TagStatus,
    pub mode: TransitionMode,
    /// Trimmed, never empty when present
    pub note: Option<String>,
    pub targets: Vec<TransitionTarget>,
    /// `None` in correction mode
    pub confirmation: Option<ConfirmationPrompt>,
}

/// Statuses a tag must currently have to move to `target` in normal mode.
///
/// An empty slice means the target has no prior-status rule.
pub fn required_prior_statuses(target: TagStatus) -> &'static [TagStatus] {
    match target.canonical() {
        TagStatus::DigOrdered => &[
            TagStatus::InZone,
            TagStatus::Available,
            TagStatus::SelectedForDig,
        ],
        TagStatus::Dug => &[TagStatus::DigOrdered],
        TagStatus::ReadyForSale => &[TagStatus::Dug],
        _ => &[],
    }
}

/// Decide whether `records` may move to `target`
pub fn evaluate(
    records: &[&TreeTag],
    target: TagStatus,
    mode: TransitionMode,
    note: Option<&str>,
) -> Result<TransitionRequest, PolicyViolation> {
    let note = note.map(str::trim).filter(|n| !n.is_empty());

    let confirmation = match mode {
        TransitionMode::Correction => {
            if note.is_none() {
                return Err(PolicyViolation::NoteRequired);
            }
            None
        }
        TransitionMode::Normal => {
            check_prior_statuses(records, target)?;
            Some(ConfirmationPrompt {
                count: records.len(),
                target,
                message: format!(
                    "Change {} tag{} to {}?",
                    records.len(),
                    if records.len() == 1 { "" } else { "s" },
                    target.label()
                ),
            })
        }
    };

    Ok(TransitionRequest {
        target,
        mode,
        note: note.map(str::to_string),
        targets: records
            .iter()
            .map(|t| TransitionTarget {
                tag_id: t.id.clone(),
                tag_code: t.tag_code.clone(),
            })
            .collect(),
        confirmation,
    })
}

fn check_prior_statuses(records: &[&TreeTag], target: TagStatus) -> Result<(), PolicyViolation> {
    let allowed = required_prior_statuses(target);
    if allowed.is_empty() {
        return Ok(());
    }

    let offenders: Vec<&TreeTag> = records
        .iter()
        .copied()
        .filter(|t| !allowed.iter().any(|s| s.same_meaning(t.status)))
        .collect();
    if offenders.is_empty() {
        return Ok(());
    }

    Err(PolicyViolation::PriorStatusMismatch {
        target,
        offenders: offenders
            .iter()
            .take(MAX_LISTED_OFFENDERS)
            .map(|t| StatusOffender {
                tag_code: t.tag_code.clone(),
                status: t.status,
            })
            .collect(),
        remaining: offenders.len().saturating_sub(MAX_LISTED_OFFENDERS),
        allowed: allowed.to_vec(),
    })
}
