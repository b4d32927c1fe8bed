//! Layered configuration loader.
//!
//! Reads the user layer, the working-directory layer and any runtime
//! override files, merges them in that order and decodes the result into a
//! validated `JulesConfig`.

mod layer_io;
mod merge;


use crate::{ConfigError, JulesConfig};
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "jules.json5";
/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".jules";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: JulesConfig,
    /// Every layer that contributed, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.jules/jules.json5`.
    User,
    /// `jules.json5` in the working directory.
    Cwd,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to find the cwd layer.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.jules/jules.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last, in order.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
        }
    }

    /// Replace the user layer location; `None` skips the user layer.
    pub fn with_user_path(mut self, path: Option<PathBuf>) -> Self {
        self.user_config_path = path;
        self
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl JulesConfig {
    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value)
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): user, cwd, runtime overrides. Runtime
    /// paths must exist; the other layers are skipped when missing.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut loaded = Vec::new();
        for (source, path) in [
            (ConfigLayerSource::User, options.user_config_path.clone()),
            (
                ConfigLayerSource::Cwd,
                Some(options.cwd.join(DEFAULT_CONFIG_FILE)),
            ),
        ] {
            if let Some(layer) = layer_io::load_optional_layer(source, path.as_deref())? {
                loaded.push(layer);
            }
        }
        for runtime_path in &options.runtime_paths {
            loaded.push(layer_io::load_required_layer(
                ConfigLayerSource::Runtime,
                runtime_path,
            )?);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        let mut layers = Vec::with_capacity(loaded.len());
        for layer in loaded {
            merge::merge_json_values(&mut merged, &layer.value);
            layers.push(layer.meta);
        }

        let config = config_from_value(merged)?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.context_window == 0 {
            return Err(ConfigError::Invalid(
                "ledger.context_window must be at least 1".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        if self.llm.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm.api_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn config_from_value(value: Value) -> Result<JulesConfig, ConfigError> {
    let config: JulesConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
