// lib/src/config/mod.rs
//
// Layered configuration: built-in defaults, then an optional YAML/TOML file,
// then `TRIAGE_`-prefixed environment variables.

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use log::{debug, info};

use models::{TriageError, TriageResult};

pub mod config_defaults;
pub mod config_structs;

pub use config_defaults::*;
pub use config_structs::{
    ModelConfig, SecurityConfig, ServerConfig, StorageConfig, TrainingConfig, TriageConfig,
};

impl TriageConfig {
    /// Loads configuration from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> TriageResult<Self> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Same as [`TriageConfig::load`] with an explicit set of environment variables.
    pub fn load_with_env(path: Option<&Path>, vars: HashMap<String, String>) -> TriageResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone().into_iter().collect())),
            )
            .set_override_option("model.path", vars.get(ENV_MODEL_PATH).cloned())?
            .set_override_option("security.api_key", vars.get(ENV_API_KEY).cloned())?;

        let config: TriageConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!("Effective configuration: {:?}", config.redacted());
        Ok(config)
    }

    pub fn validate(&self) -> TriageResult<()> {
        self.thresholds.validate().map_err(|e| TriageError::ConfigError(e.to_string()))?;
        let fraction = self.training.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(TriageError::ConfigError(format!(
                "training.test_fraction must lie in (0, 1), got {}",
                fraction
            )));
        }
        if self.training.epochs == 0 {
            return Err(TriageError::ConfigError("training.epochs must be positive".into()));
        }
        if !(self.training.learning_rate > 0.0) || !(self.training.l2 >= 0.0) {
            return Err(TriageError::ConfigError("training.learning_rate must be positive and training.l2 non-negative".into()));
        }
        if self.storage.patients_tree.is_empty() || self.storage.appointments_tree.is_empty() {
            return Err(TriageError::ConfigError("storage tree names must not be empty".into()));
        }
        Ok(())
    }

    /// A copy safe to log: secrets replaced.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.security.api_key.is_some() {
            copy.security.api_key = Some("***".into());
        }
        if copy.security.api_key_hash.is_some() {
            copy.security.api_key_hash = Some("***".into());
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn should_fall_back_to_defaults() {
        let config = TriageConfig::load_with_env(None, HashMap::new()).unwrap();
        assert_eq!(config, TriageConfig::default());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.thresholds.emergency, 0.5);
        assert_eq!(config.storage.update_timeout_ms, 2000);
        assert_eq!(config.training.random_state, 42);
    }

    #[test]
    fn should_read_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triage.yaml");
        fs::write(
            &path,
            "server:\n  port: 9100\nthresholds:\n  high_risk: 0.7\nmodel:\n  path: /srv/model.json\n",
        )
        .unwrap();
        let config = TriageConfig::load_with_env(Some(&path), HashMap::new()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.thresholds.high_risk, 0.7);
        assert_eq!(config.thresholds.emergency, 0.5);
        assert_eq!(config.model.path, Path::new("/srv/model.json"));
    }

    #[test]
    fn should_let_environment_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triage.toml");
        fs::write(&path, "[server]\nport = 9100\n").unwrap();
        let vars = env(&[
            ("TRIAGE_SERVER__PORT", "9200"),
            ("TRIAGE_MODEL_PATH", "/tmp/m.bin"),
            ("TRIAGE_API_KEY", "s3cret"),
        ]);
        let config = TriageConfig::load_with_env(Some(&path), vars).unwrap();
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.model.path, Path::new("/tmp/m.bin"));
        assert_eq!(config.security.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.redacted().security.api_key.as_deref(), Some("***"));
    }

    #[test]
    fn should_reject_out_of_range_thresholds() {
        let vars = env(&[("TRIAGE_THRESHOLDS__EMERGENCY", "1.5")]);
        let err = TriageConfig::load_with_env(None, vars).unwrap_err();
        assert!(matches!(err, TriageError::ConfigError(_)));
    }

    #[test]
    fn should_reject_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(TriageConfig::load_with_env(Some(&missing), HashMap::new()).is_err());
    }
}
