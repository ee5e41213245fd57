// lib/src/config/config_structs.rs
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::FitParams;
use crate::combiner::DecisionThresholds;
use crate::config::config_defaults::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Artifact location. A `.json` extension selects JSON encoding.
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { path: default_model_path() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default = "default_patients_tree")]
    pub patients_tree: String,
    #[serde(default = "default_appointments_tree")]
    pub appointments_tree: String,
    #[serde(default = "default_update_timeout_ms")]
    pub update_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            patients_tree: default_patients_tree(),
            appointments_tree: default_appointments_tree(),
            update_timeout_ms: default_update_timeout_ms(),
        }
    }
}

impl StorageConfig {
    pub fn update_timeout(&self) -> Duration {
        Duration::from_millis(self.update_timeout_ms)
    }
}

/// Caller authorization. With neither field set the service is open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Argon2 PHC string; takes precedence over `api_key`.
    #[serde(default)]
    pub api_key_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_l2")]
    pub l2: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            random_state: default_random_state(),
            test_fraction: default_test_fraction(),
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            l2: default_l2(),
        }
    }
}

impl TrainingConfig {
    pub fn fit_params(&self) -> FitParams {
        FitParams { epochs: self.epochs, learning_rate: self.learning_rate, l2: self.l2 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub thresholds: DecisionThresholds,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}
