//! Service configuration
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! `PSP_RISK_*` environment variables, then command-line overrides.

use config::{Config, Environment, File as ConfigFile};
use psp_ai_core::{ArtifactPaths, HASH_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{Result, ServiceError};

/// Prefix of environment variables read by [`ServiceConfig::load`]
pub const ENV_PREFIX: &str = "PSP_RISK";

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub model_path: PathBuf,
    pub columns_path: PathBuf,
    /// Digest of the model file, verified when present. Defaults to
    /// `model.hash` next to `model_path`.
    pub hash_path: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let paths = ArtifactPaths::in_dir("models");
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            model_path: paths.model,
            columns_path: paths.columns,
            hash_path: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Values given on the command line; `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_addr: Option<String>,
    pub model_path: Option<PathBuf>,
    pub columns_path: Option<PathBuf>,
    pub hash_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl ServiceConfig {
    /// Load defaults, then `file` (must exist when given), then the
    /// process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(file: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            if !path.exists() {
                return Err(ServiceError::ConfigFileMissing(path.display().to_string()));
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(env);

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(listen_addr) = overrides.listen_addr {
            self.listen_addr = listen_addr;
        }
        if let Some(model_path) = overrides.model_path {
            self.model_path = model_path;
        }
        if let Some(columns_path) = overrides.columns_path {
            self.columns_path = columns_path;
        }
        if let Some(hash_path) = overrides.hash_path {
            self.hash_path = Some(hash_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            columns: self.columns_path.clone(),
            hash: self
                .hash_path
                .clone()
                .unwrap_or_else(|| self.model_path.with_file_name(HASH_FILE)),
        }
    }
}
