//! Shared types for the nursery tag workspace
//!
//! Tree tag models, lifecycle statuses and the bulk transition values
//! (policy rejections, reports, events) handed to the presentation layer.

pub mod models;
pub mod transition;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{TagStatus, TreeTag, TreeTagCreate, TreeTagRow, TreeTagUpdate, Zone};
pub use transition::{
    Notice, NoticeTarget, PolicyViolation, ReportKind, StatusOffender, TagEvent,
    TransitionFailure, TransitionMode, TransitionReport,
};
