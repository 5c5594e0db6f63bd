//! Configuration for steward
//!
//! 優先順位（後勝ち）: 既定値 → 設定ファイル → `STEWARD_*` 環境変数 → CLI フラグ
//! CLI フラグの適用は呼び出し側（steward-cli）で行います。

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::StewardError;

const ENV_PREFIX: &str = "STEWARD";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider region
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    /// Fixture document backing the provider
    #[serde(default)]
    pub fixture: Option<PathBuf>,

    /// Default tracing filter
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: None,
            access_key: None,
            secret_key: None,
            fixture: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, StewardError> {
        Self::load_from(path, None)
    }

    /// Same as `load`, reading `STEWARD_*` variables from `env` instead of the
    /// process environment when given.
    pub fn load_from(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, StewardError> {
        let mut builder = config::Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(config_error)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .source(env)
                .try_parsing(false),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)
    }

    /// Resolve what the provider client needs to connect.
    pub fn connection(&self) -> Result<Connection, StewardError> {
        let region = self
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(StewardError::RegionRequired)?
            .to_string();

        let credentials = match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => Some(Credentials {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(StewardError::Config(
                    "access_key and secret_key must be given together".to_string(),
                ));
            }
        };

        Ok(Connection {
            region,
            credentials,
        })
    }
}

fn config_error(err: config::ConfigError) -> StewardError {
    StewardError::Config(err.to_string())
}

/// Resolved connection parameters, passed through to the provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub region: String,
    /// `None` means the provider's own credential chain applies.
    pub credentials: Option<Credentials>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
