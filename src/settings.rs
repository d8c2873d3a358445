use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{EsgError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "nbroad/ESG-BERT";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONFIG_FILE: &str = "esg_classifier";

/// Classifier settings. Layered lowest to highest: built-in defaults,
/// `esg_classifier.toml` (or `--config`), `ESG_*` environment variables,
/// then command-line flags.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Self::build(file, Some(Environment::with_prefix("ESG")))
    }

    fn build<S>(file: S, env: Option<Environment>) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder()
            .set_default("endpoint", DEFAULT_ENDPOINT)
            .and_then(|b| b.set_default("model", DEFAULT_MODEL))
            .and_then(|b| b.set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64))
            .map_err(|e| EsgError::Config(e.to_string()))?
            .add_source(file);
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| EsgError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply command-line overrides on top of the loaded layers.
    pub fn with_overrides(mut self, endpoint: Option<String>, model: Option<String>) -> Result<Self> {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(model) = model {
            self.model = model;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(EsgError::Config("endpoint must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(EsgError::Config("model must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(EsgError::Config("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}
