//! Tree Tag Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::status::TagStatus;

/// Tree tag entity (one QR-coded physical tag, one or more trees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeTag {
    pub id: String,
    pub tag_code: String,
    pub zone_id: String,
    pub status: TagStatus,
    pub quantity: i32,
    pub row_number: Option<i32>,
    pub position: Option<i32>,
    pub notes: Option<String>,
    pub species: Option<String>,
    pub size_label: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row exactly as the backend returns it
///
/// `status` is kept as a raw string until [`TreeTag::try_from`] validates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeTagRow {
    pub id: String,
    pub tag_code: String,
    pub zone_id: String,
    pub status: String,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub row_number: Option<i32>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub size_label: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A backend row that cannot become a [`TreeTag`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTagRow {
    #[error("Tag {tag_code} has unknown status '{status}'")]
    UnknownStatus { tag_code: String, status: String },

    #[error("Tag {tag_code} has negative quantity {quantity}")]
    NegativeQuantity { tag_code: String, quantity: i32 },
}

impl TryFrom<TreeTagRow> for TreeTag {
    type Error = InvalidTagRow;

    fn try_from(row: TreeTagRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<TagStatus>()
            .map_err(|_| InvalidTagRow::UnknownStatus {
                tag_code: row.tag_code.clone(),
                status: row.status.clone(),
            })?;

        // missing quantity means a single tree
        let quantity = row.quantity.unwrap_or(1);
        if quantity < 0 {
            return Err(InvalidTagRow::NegativeQuantity {
                tag_code: row.tag_code,
                quantity,
            });
        }

        Ok(Self {
            id: row.id,
            tag_code: row.tag_code,
            zone_id: row.zone_id,
            status,
            quantity,
            row_number: row.row_number,
            position: row.position,
            notes: row.notes.filter(|n| !n.trim().is_empty()),
            species: row.species,
            size_label: row.size_label,
            updated_at: row.updated_at,
        })
    }
}

/// Create tree tag payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeTagCreate {
    pub zone_id: String,
    pub tag_code: String,
    pub quantity: i32,
    #[serde(default = "default_initial_status")]
    pub status: TagStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_initial_status() -> TagStatus {
    TagStatus::InZone
}

impl TreeTagCreate {
    /// New tag in zone with default `in_zone` status
    pub fn new(zone_id: impl Into<String>, tag_code: impl Into<String>, quantity: i32) -> Self {
        Self {
            zone_id: zone_id.into(),
            tag_code: tag_code.into(),
            quantity,
            status: default_initial_status(),
            species: None,
            size_label: None,
            row_number: None,
            position: None,
            notes: None,
        }
    }
}

/// Update tree tag payload
///
/// Status is not editable here; it only changes through status transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeTagUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_label: Option<String>,
}
