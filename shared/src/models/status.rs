//! Tree tag lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a physical tree tag
///
/// Wire values are snake_case (`in_zone`, `dig_ordered`, ...).
/// `Available` is the legacy spelling of `InZone`; it is kept as its own
/// variant so the stored value can still be displayed as-is. Use
/// [`TagStatus::canonical`] before comparing statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStatus {
    InZone,
    /// Legacy alias of `InZone`
    Available,
    SelectedForDig,
    RootPruningStarted,
    RootPruningComplete,
    ReadyToLift,
    Reserved,
    DigOrdered,
    Dug,
    ReadyForSale,
    Shipped,
    Planted,
    Rehab,
    Dead,
    Cancelled,
    Lost,
}

/// Returned when a status string is not part of the enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tag status: {0}")]
pub struct UnknownStatus(pub String);

impl TagStatus {
    /// Every status, in lifecycle order
    pub const ALL: [TagStatus; 16] = [
        TagStatus::InZone,
        TagStatus::Available,
        TagStatus::SelectedForDig,
        TagStatus::RootPruningStarted,
        TagStatus::RootPruningComplete,
        TagStatus::ReadyToLift,
        TagStatus::Reserved,
        TagStatus::DigOrdered,
        TagStatus::Dug,
        TagStatus::ReadyForSale,
        TagStatus::Shipped,
        TagStatus::Planted,
        TagStatus::Rehab,
        TagStatus::Dead,
        TagStatus::Cancelled,
        TagStatus::Lost,
    ];

    /// Wire value as stored by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InZone => "in_zone",
            Self::Available => "available",
            Self::SelectedForDig => "selected_for_dig",
            Self::RootPruningStarted => "root_pruning_started",
            Self::RootPruningComplete => "root_pruning_complete",
            Self::ReadyToLift => "ready_to_lift",
            Self::Reserved => "reserved",
            Self::DigOrdered => "dig_ordered",
            Self::Dug => "dug",
            Self::ReadyForSale => "ready_for_sale",
            Self::Shipped => "shipped",
            Self::Planted => "planted",
            Self::Rehab => "rehab",
            Self::Dead => "dead",
            Self::Cancelled => "cancelled",
            Self::Lost => "lost",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::InZone => "In Zone",
            Self::Available => "Available",
            Self::SelectedForDig => "Selected for Dig",
            Self::RootPruningStarted => "Root Pruning Started",
            Self::RootPruningComplete => "Root Pruning Complete",
            Self::ReadyToLift => "Ready to Lift",
            Self::Reserved => "Reserved",
            Self::DigOrdered => "Dig Ordered",
            Self::Dug => "Dug",
            Self::ReadyForSale => "Ready for Sale",
            Self::Shipped => "Shipped",
            Self::Planted => "Planted",
            Self::Rehab => "Rehab",
            Self::Dead => "Dead",
            Self::Cancelled => "Cancelled",
            Self::Lost => "Lost",
        }
    }

    /// Canonical meaning of this status (folds legacy aliases)
    pub fn canonical(self) -> Self {
        match self {
            Self::Available => Self::InZone,
            other => other,
        }
    }

    /// Compare two statuses by meaning rather than spelling
    pub fn same_meaning(self, other: TagStatus) -> bool {
        self.canonical() == other.canonical()
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TagStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        TagStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
