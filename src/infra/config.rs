use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "GATEWAY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub server_name: String,
    pub server_version: String,
    pub log_level: String,
    pub earth2: Earth2Config,
}

/// Downstream forecast service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Earth2Config {
    pub base_url: String,
    pub health_path: String,
    pub forecast_path: String,
    pub stream_path: String,
    pub ngc_api_key: String,
    /// Sent as a bearer token when non-empty.
    pub api_token: String,
    /// Retries for idempotent GETs; POSTs are never retried.
    pub retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            server_name: "earth2-mcp".into(),
            server_version: "1.0.0".into(),
            log_level: "info".into(),
            earth2: Earth2Config::default(),
        }
    }
}

impl Default for Earth2Config {
    fn default() -> Self {
        Self {
            base_url: "http://earth_2_fourcastnet:8000".into(),
            health_path: "/health".into(),
            forecast_path: "/api/forecast".into(),
            stream_path: "/api/forecast/stream".into(),
            ngc_api_key: String::new(),
            api_token: String::new(),
            retries: 1,
        }
    }
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub server_name: Option<String>,
    pub server_version: Option<String>,
    pub log_level: Option<String>,
    pub earth2: FileEarth2Config,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileEarth2Config {
    pub base_url: Option<String>,
    pub health_path: Option<String>,
    pub forecast_path: Option<String>,
    pub stream_path: Option<String>,
    pub ngc_api_key: Option<String>,
    pub api_token: Option<String>,
    pub retries: Option<u32>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
    }
}

impl Config {
    /// Environment only.
    pub fn from_env() -> Self {
        Self::from_sources(FileConfig::default(), |k| std::env::var(k).ok())
    }

    /// TOML file named by `GATEWAY_CONFIG` (if set), overridden by environment.
    pub fn from_env_and_toml() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_PATH_VAR) {
            Ok(p) if !p.trim().is_empty() => FileConfig::load(Path::new(&p))?,
            _ => FileConfig::default(),
        };
        Ok(Self::from_sources(file, |k| std::env::var(k).ok()))
    }

    /// Precedence: env, then file, then defaults. Unparsable numbers fall back.
    pub fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let d = Config::default();
        let e = d.earth2;
        let s = |key: &str, file_val: Option<String>, default: String| {
            env(key).or(file_val).unwrap_or(default)
        };

        Self {
            port: env("PORT")
                .and_then(|v| v.parse().ok())
                .or(file.port)
                .unwrap_or(d.port),
            server_name: s("MCP_SERVER_NAME", file.server_name, d.server_name),
            server_version: s("MCP_SERVER_VERSION", file.server_version, d.server_version),
            log_level: s("LOG_LEVEL", file.log_level, d.log_level),
            earth2: Earth2Config {
                base_url: s("EARTH2_BASE_URL", file.earth2.base_url, e.base_url),
                health_path: s("EARTH2_HEALTH_PATH", file.earth2.health_path, e.health_path),
                forecast_path: s("EARTH2_FORECAST_PATH", file.earth2.forecast_path, e.forecast_path),
                stream_path: s("EARTH2_STREAM_PATH", file.earth2.stream_path, e.stream_path),
                ngc_api_key: s("NGC_API_KEY", file.earth2.ngc_api_key, e.ngc_api_key),
                api_token: s("INTERNAL_API_TOKEN", file.earth2.api_token, e.api_token),
                retries: env("EARTH2_RETRIES")
                    .and_then(|v| v.parse().ok())
                    .or(file.earth2.retries)
                    .unwrap_or(e.retries),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("PORT cannot be 0".into()));
        }
        let base = &self.earth2.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "EARTH2_BASE_URL must start with http:// or https://, got '{base}'"
            )));
        }
        Ok(())
    }
}
