//! Tag collection store
//!
//! Holds the tags visible for one zone. Rows are validated into
//! [`TreeTag`] on the way in; a row that fails validation fails the whole
//! load rather than silently disappearing from the list.

use serde_json::Value;
use shared::{TreeTag, TreeTagCreate, TreeTagRow, TreeTagUpdate, Zone};
use std::collections::HashSet;
use std::sync::Arc;

use crate::remote::{Filter, OrderBy, RemoteDataService, SelectQuery};
use crate::{ClientError, ClientResult, StoreError, StoreResult};

/// Load state of the store
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Current tag list for a zone
pub struct TagStore {
    remote: Arc<dyn RemoteDataService>,
    table: String,
    zone_id: Option<String>,
    tags: Vec<TreeTag>,
    state: LoadState,
}

impl std::fmt::Debug for TagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagStore")
            .field("remote", &"<RemoteDataService>")
            .field("table", &self.table)
            .field("zone_id", &self.zone_id)
            .field("tags", &self.tags.len())
            .field("state", &self.state)
            .finish()
    }
}

impl TagStore {
    pub fn new(remote: Arc<dyn RemoteDataService>, table: impl Into<String>) -> Self {
        Self {
            remote,
            table: table.into(),
            zone_id: None,
            tags: Vec::new(),
            state: LoadState::Idle,
        }
    }

    pub fn zone_id(&self) -> Option<&str> {
        self.zone_id.as_deref()
    }

    pub fn tags(&self) -> &[TreeTag] {
        &self.tags
    }

    pub fn get(&self, id: &str) -> Option<&TreeTag> {
        self.tags.iter().find(|t| t.id == id)
    }

    /// Identifiers of every loaded tag
    pub fn ids(&self) -> HashSet<String> {
        self.tags.iter().map(|t| t.id.clone()).collect()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Message of the last failed load, if any
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Fetch every tag of `zone_id`
    pub async fn load(&mut self, zone_id: &str) -> StoreResult<&[TreeTag]> {
        if self.zone_id.as_deref() != Some(zone_id) {
            self.tags.clear();
            self.zone_id = Some(zone_id.to_string());
        }
        self.fetch().await
    }

    /// Re-run the last load with the same zone
    pub async fn reload(&mut self) -> StoreResult<&[TreeTag]> {
        if self.zone_id.is_none() {
            return Err(StoreError::NoZoneLoaded);
        }
        self.fetch().await
    }

    async fn fetch(&mut self) -> StoreResult<&[TreeTag]> {
        let zone_id = self.zone_id.clone().ok_or(StoreError::NoZoneLoaded)?;
        self.state = LoadState::Loading;

        let result = self
            .remote
            .query(&self.table, &Self::zone_query(&zone_id))
            .await
            .and_then(parse_tags);

        match result {
            Ok(tags) => {
                // kept in server order; species and size follow the database collation
                tracing::debug!(zone_id = %zone_id, count = tags.len(), "Tags loaded");
                self.tags = tags;
                self.state = LoadState::Loaded;
                Ok(&self.tags)
            }
            Err(e) => {
                tracing::warn!(zone_id = %zone_id, error = %e, "Failed to load tags");
                self.state = LoadState::Failed(e.to_string());
                Err(StoreError::RemoteFetch(e))
            }
        }
    }

    fn zone_query(zone_id: &str) -> SelectQuery {
        SelectQuery::new()
            .filter(Filter::eq("zone_id", zone_id))
            .order_by(OrderBy::asc("species").nulls_first())
            .order_by(OrderBy::asc("size_label").nulls_first())
            .order_by(OrderBy::asc("row_number").nulls_first())
            .order_by(OrderBy::asc("position").nulls_first())
    }

    /// Create many tags in one request, then reload
    pub async fn create_batch(
        &mut self,
        payloads: Vec<TreeTagCreate>,
    ) -> StoreResult<Vec<TreeTag>> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::to_value(&payloads)
            .map_err(|e| StoreError::RemoteWrite(e.into()))?;
        let created = self
            .remote
            .insert(&self.table, body)
            .await
            .and_then(parse_tags)
            .map_err(StoreError::RemoteWrite)?;
        tracing::info!(count = created.len(), "Tags created");
        self.refresh_after_write().await;
        Ok(created)
    }

    /// Edit tag fields (never its status), then reload
    pub async fn update(&mut self, id: &str, patch: TreeTagUpdate) -> StoreResult<TreeTag> {
        let body = serde_json::to_value(&patch).map_err(|e| StoreError::RemoteWrite(e.into()))?;
        let row = self
            .remote
            .update(&self.table, id, body)
            .await
            .map_err(StoreError::RemoteWrite)?;
        let tag = parse_tag(row).map_err(StoreError::RemoteWrite)?;
        self.refresh_after_write().await;
        Ok(tag)
    }

    /// Delete a tag, then reload
    pub async fn delete(&mut self, id: &str) -> StoreResult<()> {
        self.remote
            .delete(&self.table, id)
            .await
            .map_err(StoreError::RemoteWrite)?;
        tracing::info!(tag_id = %id, "Tag deleted");
        self.refresh_after_write().await;
        Ok(())
    }

    /// The write already succeeded; a failed reload is left in `state`
    async fn refresh_after_write(&mut self) {
        if self.zone_id.is_some()
            && let Err(e) = self.fetch().await
        {
            tracing::warn!(error = %e, "Reload after write failed");
        }
    }
}

/// List every zone, ordered by name
pub async fn list_zones(remote: &dyn RemoteDataService, table: &str) -> StoreResult<Vec<Zone>> {
    let rows = remote
        .query(table, &SelectQuery::new().order_by(OrderBy::asc("name")))
        .await
        .map_err(StoreError::RemoteFetch)?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::RemoteFetch(e.into())))
        .collect()
}

fn parse_tag(row: Value) -> ClientResult<TreeTag> {
    let row: TreeTagRow = serde_json::from_value(row)?;
    TreeTag::try_from(row).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

fn parse_tags(rows: Vec<Value>) -> ClientResult<Vec<TreeTag>> {
    rows.into_iter().map(parse_tag).collect()
}
