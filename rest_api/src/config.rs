// rest_api/src/config.rs

use anyhow::{Context, Result};
use lib::TriageConfig;
use security::ApiKeyPolicy;

/// Represents the configuration for the REST API server itself.
#[derive(Debug, Clone)]
pub struct RestApiConfig {
    pub host: String,
    pub port: u16,
    pub policy: ApiKeyPolicy,
}

impl RestApiConfig {
    pub fn from_triage_config(config: &TriageConfig) -> Result<Self> {
        let policy = ApiKeyPolicy::from_settings(
            config.security.api_key.as_deref(),
            config.security.api_key_hash.as_deref(),
        )
        .context("Invalid security configuration")?;
        Ok(Self { host: config.server.host.clone(), port: config.server.port, policy })
    }

    /// Overrides the configured port, e.g. from a command-line flag.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
