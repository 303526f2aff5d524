//! Bulk status transition types
//!
//! These are the values the presentation layer renders: policy rejections,
//! the aggregate report of a bulk run and the "tags changed" event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::models::TagStatus;

/// How a bulk status change is validated and recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    /// Prior-status rules apply, note optional
    #[default]
    Normal,
    /// Operator override: any prior status, note mandatory
    Correction,
}

/// A selected tag whose current status blocks the requested target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOffender {
    pub tag_code: String,
    pub status: TagStatus,
}

impl fmt::Display for StatusOffender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.tag_code, self.status.label())
    }
}

/// Transition rejected before any remote call
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyViolation {
    #[error(
        "Cannot move to {target}: {listed} must be one of [{allowed_labels}]",
        listed = describe_offenders(offenders, *remaining),
        allowed_labels = join_labels(allowed)
    )]
    PriorStatusMismatch {
        target: TagStatus,
        /// At most three sampled offenders
        offenders: Vec<StatusOffender>,
        /// Offenders not listed in `offenders`
        remaining: usize,
        allowed: Vec<TagStatus>,
    },

    #[error("A note is required in correction mode")]
    NoteRequired,
}

fn describe_offenders(offenders: &[StatusOffender], remaining: usize) -> String {
    let listed = offenders
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if remaining > 0 {
        format!("{} and {} more", listed, remaining)
    } else {
        listed
    }
}

fn join_labels(statuses: &[TagStatus]) -> String {
    statuses
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One tag that could not be transitioned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionFailure {
    pub tag_id: String,
    pub tag_code: String,
    pub message: String,
}

/// Overall result class of a bulk run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    FullSuccess,
    PartialSuccess,
    TotalFailure,
}

/// Presentation view a notice points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeTarget {
    StockView,
}

/// Time-limited notification shown after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub target: NoticeTarget,
    /// Auto-dismiss delay
    #[serde(with = "duration_millis")]
    pub dismiss_after: Duration,
}

/// Aggregate result of one bulk status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    pub target: TagStatus,
    pub mode: TransitionMode,
    pub kind: ReportKind,
    pub succeeded: Vec<String>,
    pub failed: Vec<TransitionFailure>,
    pub message: String,
    /// Up to three failure messages for display
    pub sampled_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    /// Set when the post-run reload failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_error: Option<String>,
}

impl TransitionReport {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Broadcast to views that summarise tags (stock counts, zone totals)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TagEvent {
    TagsChanged {
        zone_id: String,
        tag_ids: Vec<String>,
    },
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
