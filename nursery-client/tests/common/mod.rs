// Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use nursery_client::{
    AutoConfirm, ClientConfig, ClientError, ClientResult, RemoteDataService, SelectQuery,
    TagStatusOrchestrator,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Barrier, Notify};

pub const ZONE: &str = "zone-1";

/// A recorded procedure call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub procedure: String,
    pub args: Value,
}

/// Holds every procedure call until released
#[derive(Default)]
pub struct Gate {
    pub started: Notify,
    pub release: Notify,
}

/// In-memory stand-in for the hosted backend
#[derive(Default)]
pub struct FakeRemote {
    rows: Mutex<Vec<Value>>,
    zones: Mutex<Vec<Value>>,
    calls: Mutex<Vec<RecordedCall>>,
    failing: Mutex<HashMap<String, String>>,
    queries: AtomicUsize,
    last_query: Mutex<Option<SelectQuery>>,
    fail_queries: AtomicBool,
    next_id: AtomicUsize,
    pub gate: Option<Gate>,
    barrier: Option<Barrier>,
}

impl FakeRemote {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows: Mutex::new(rows),
            zones: Mutex::new(vec![json!({ "id": ZONE, "name": "North Field" })]),
            ..Default::default()
        }
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Gate::default());
        self
    }

    /// Every procedure call waits until `parties` calls are in flight
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Barrier::new(parties));
        self
    }

    /// Make status changes for `tag_id` fail with `message`
    pub fn fail_tag(&self, tag_id: &str, message: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(tag_id.to_string(), message.to_string());
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Drop a row behind the client's back
    pub fn remove_row(&self, id: &str) {
        self.rows.lock().unwrap().retain(|r| r["id"] != id);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<SelectQuery> {
        self.last_query.lock().unwrap().clone()
    }

    pub fn status_of(&self, id: &str) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r["id"] == id)
            .and_then(|r| r["status"].as_str().map(str::to_string))
    }
}

#[async_trait]
impl RemoteDataService for FakeRemote {
    async fn query(&self, resource: &str, query: &SelectQuery) -> ClientResult<Vec<Value>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ClientError::api("connection refused"));
        }
        if resource == "zones" {
            return Ok(self.zones.lock().unwrap().clone());
        }

        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|f| row[f.column.as_str()].as_str() == Some(f.value.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn call(&self, procedure: &str, args: Value) -> ClientResult<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            procedure: procedure.to_string(),
            args: args.clone(),
        });

        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        let tag_id = args["p_tag_id"].as_str().unwrap_or_default().to_string();
        if let Some(message) = self.failing.lock().unwrap().get(&tag_id) {
            return Err(ClientError::api(message.clone()));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r["id"] == tag_id.as_str())
            .ok_or_else(|| ClientError::api(format!("tag {} not found", tag_id)))?;
        row["status"] = args["p_target_status"].clone();
        Ok(Value::Null)
    }

    async fn insert(&self, _resource: &str, rows: Value) -> ClientResult<Vec<Value>> {
        let incoming = match rows {
            Value::Array(rows) => rows,
            other => vec![other],
        };
        let mut stored = Vec::new();
        for mut row in incoming {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            row["id"] = json!(format!("new-{}", n));
            stored.push(row);
        }
        self.rows.lock().unwrap().extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, _resource: &str, id: &str, patch: Value) -> ClientResult<Value> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r["id"] == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
        if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, _resource: &str, id: &str) -> ClientResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r["id"] != id);
        if rows.len() == before {
            return Err(ClientError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

pub fn tag_row(id: &str, code: &str, status: &str) -> Value {
    json!({
        "id": id,
        "tag_code": code,
        "zone_id": ZONE,
        "status": status,
        "quantity": 1,
        "species": "Quercus rubra",
        "size_label": "2in",
        "row_number": 1,
        "position": id.trim_start_matches(|c: char| !c.is_ascii_digit()).parse::<i32>().ok(),
    })
}

pub fn config() -> ClientConfig {
    ClientConfig::new("http://localhost:54321", "anon-key")
}

pub fn orchestrator(remote: Arc<FakeRemote>) -> TagStatusOrchestrator {
    TagStatusOrchestrator::new(remote, &config(), Arc::new(AutoConfirm))
}
