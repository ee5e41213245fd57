// lib/src/config/config_defaults.rs
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MODEL_PATH: &str = "model/triage_pipeline.bin";
pub const DEFAULT_DATA_DIRECTORY: &str = "./data/triage";
pub const DEFAULT_PATIENTS_TREE: &str = "patients";
pub const DEFAULT_APPOINTMENTS_TREE: &str = "appointments";
pub const DEFAULT_UPDATE_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_RANDOM_STATE: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Prefix of environment overrides, e.g. `TRIAGE_SERVER__PORT`.
pub const ENV_PREFIX: &str = "TRIAGE";
pub const ENV_MODEL_PATH: &str = "TRIAGE_MODEL_PATH";
pub const ENV_API_KEY: &str = "TRIAGE_API_KEY";

pub fn default_host() -> String { DEFAULT_HOST.to_string() }
pub fn default_port() -> u16 { DEFAULT_PORT }
pub fn default_model_path() -> PathBuf { PathBuf::from(DEFAULT_MODEL_PATH) }
pub fn default_data_directory() -> PathBuf { PathBuf::from(DEFAULT_DATA_DIRECTORY) }
pub fn default_patients_tree() -> String { DEFAULT_PATIENTS_TREE.to_string() }
pub fn default_appointments_tree() -> String { DEFAULT_APPOINTMENTS_TREE.to_string() }
pub fn default_update_timeout_ms() -> u64 { DEFAULT_UPDATE_TIMEOUT_MS }
pub fn default_random_state() -> u64 { DEFAULT_RANDOM_STATE }
pub fn default_test_fraction() -> f64 { DEFAULT_TEST_FRACTION }
pub fn default_epochs() -> usize { 300 }
pub fn default_learning_rate() -> f64 { 0.1 }
pub fn default_l2() -> f64 { 1e-4 }
