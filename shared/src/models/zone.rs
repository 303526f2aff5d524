//! Zone Model

use serde::{Deserialize, Serialize};

/// Zone entity (a physical planting area that scopes tree tags)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
