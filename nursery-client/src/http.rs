//! Supabase (PostgREST) implementation of the remote data service

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::remote::{RemoteDataService, SelectQuery};
use crate::{ClientConfig, ClientError, ClientResult};

/// PostgREST error body
#[derive(serde::Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    message: String,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// HTTP client for the hosted backend's REST and RPC endpoints
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    /// Create a new client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("base URL is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach API key and bearer token; the backend resolves the acting user from the token
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn handle_response(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<PostgrestError>(&text) {
                return Err(ClientError::Api {
                    code: err.code,
                    message: err.message,
                    details: err.details,
                    hint: err.hint,
                });
            }
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Internal(format!("{}: {}", status, text))),
            };
        }

        // void procedures and `return=minimal` writes answer with an empty body
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn into_rows(value: Value) -> ClientResult<Vec<Value>> {
        match value {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            obj @ Value::Object(_) => Ok(vec![obj]),
            other => Err(ClientError::InvalidResponse(format!(
                "expected rows, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl RemoteDataService for SupabaseClient {
    async fn query(&self, resource: &str, query: &SelectQuery) -> ClientResult<Vec<Value>> {
        tracing::debug!(resource, filters = query.filters.len(), "Querying rows");
        let request = self
            .client
            .get(self.rest_url(resource))
            .query(&query.to_query_pairs());
        let response = self.authorize(request).send().await?;
        Self::into_rows(Self::handle_response(response).await?)
    }

    async fn call(&self, procedure: &str, args: Value) -> ClientResult<Value> {
        tracing::debug!(procedure, "Calling remote procedure");
        let request = self
            .client
            .post(self.rest_url(&format!("rpc/{}", procedure)))
            .json(&args);
        let response = self.authorize(request).send().await?;
        Self::handle_response(response).await
    }

    async fn insert(&self, resource: &str, rows: Value) -> ClientResult<Vec<Value>> {
        tracing::debug!(resource, "Inserting rows");
        let request = self
            .client
            .post(self.rest_url(resource))
            .header("Prefer", "return=representation")
            .json(&rows);
        let response = self.authorize(request).send().await?;
        Self::into_rows(Self::handle_response(response).await?)
    }

    async fn update(&self, resource: &str, id: &str, patch: Value) -> ClientResult<Value> {
        tracing::debug!(resource, id, "Updating row");
        let request = self
            .client
            .patch(self.rest_url(resource))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.authorize(request).send().await?;
        Self::into_rows(Self::handle_response(response).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(format!("{} {}", resource, id)))
    }

    async fn delete(&self, resource: &str, id: &str) -> ClientResult<()> {
        tracing::debug!(resource, id, "Deleting row");
        let request = self
            .client
            .delete(self.rest_url(resource))
            .query(&[("id", format!("eq.{}", id))]);
        let response = self.authorize(request).send().await?;
        Self::handle_response(response).await.map(|_| ())
    }
}
