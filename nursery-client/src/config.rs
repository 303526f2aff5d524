//! Client configuration

use std::time::Duration;

use crate::{ClientError, ClientResult};

/// Client configuration for the hosted backend
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | SUPABASE_URL | (required) | Project URL |
/// | SUPABASE_ANON_KEY | (required) | Public API key |
/// | SUPABASE_ACCESS_TOKEN | - | Signed-in user's JWT |
/// | REQUEST_TIMEOUT_SECS | 30 | Per-request timeout |
/// | TREE_TAG_TABLE | tree_tags | Tag table name |
/// | ZONE_TABLE | zones | Zone table name |
/// | STATUS_RPC | update_tree_tag_status | Normal status change procedure |
/// | CORRECTION_RPC | correct_tree_tag_status | Correction procedure |
/// | NOTICE_DISMISS_SECS | 8 | Ready-for-sale notice lifetime |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co")
    pub base_url: String,

    /// Public API key sent as `apikey`
    pub anon_key: String,

    /// JWT of the signed-in user; the anon key is used when absent
    pub access_token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    pub tag_table: String,
    pub zone_table: String,

    /// Remote procedure for normal status changes
    pub status_procedure: String,

    /// Remote procedure for correction-mode status changes
    pub correction_procedure: String,

    /// How long the ready-for-sale notice stays visible
    pub notice_dismiss_after: Duration,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the endpoint
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            access_token: None,
            timeout: 30,
            tag_table: "tree_tags".into(),
            zone_table: "zones".into(),
            status_procedure: "update_tree_tag_status".into(),
            correction_procedure: "correct_tree_tag_status".into(),
            notice_dismiss_after: Duration::from_secs(8),
        }
    }

    /// Load from environment variables (a `.env` file is honoured)
    pub fn from_env() -> ClientResult<Self> {
        dotenv::dotenv().ok();

        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| ClientError::Config("SUPABASE_URL is not set".into()))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| ClientError::Config("SUPABASE_ANON_KEY is not set".into()))?;

        let mut config = Self::new(base_url, anon_key);
        config.access_token = std::env::var("SUPABASE_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        config.timeout = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.timeout);
        if let Ok(table) = std::env::var("TREE_TAG_TABLE") {
            config.tag_table = table;
        }
        if let Ok(table) = std::env::var("ZONE_TABLE") {
            config.zone_table = table;
        }
        if let Ok(name) = std::env::var("STATUS_RPC") {
            config.status_procedure = name;
        }
        if let Ok(name) = std::env::var("CORRECTION_RPC") {
            config.correction_procedure = name;
        }
        if let Some(secs) = std::env::var("NOTICE_DISMISS_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.notice_dismiss_after = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the user access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Override the status procedures
    pub fn with_procedures(
        mut self,
        status_procedure: impl Into<String>,
        correction_procedure: impl Into<String>,
    ) -> Self {
        self.status_procedure = status_procedure.into();
        self.correction_procedure = correction_procedure.into();
        self
    }

    /// Override the ready-for-sale notice lifetime
    pub fn with_notice_dismiss_after(mut self, duration: Duration) -> Self {
        self.notice_dismiss_after = duration;
        self
    }

    /// Create the Supabase HTTP client from this configuration
    pub fn build_supabase_client(&self) -> ClientResult<crate::SupabaseClient> {
        crate::SupabaseClient::new(self)
    }
}
