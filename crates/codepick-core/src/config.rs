use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_LOOKUP_LIMIT: usize = 200;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodepickConfig {
    pub version: u32,
    pub engine: EngineConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    pub url: String,
    #[serde(default = "default_engine_timeout_secs")]
    pub timeout_secs: u64,
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub source: CatalogSourceKind,
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    #[serde(default = "default_lookup_limit")]
    pub limit: usize,
    #[serde(default = "default_catalog_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    Http,
    File,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubmitConfig {
    #[serde(default)]
    pub sink: SinkKind,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Log,
    Directory,
}

/// Catalog settings after validation, with the source-specific field resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Http { url: String, timeout: Duration },
    File { path: PathBuf },
}

fn default_engine_timeout_secs() -> u64 {
    120
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_lookup_limit() -> usize {
    20
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

pub fn resolve_config_dir() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs.home_dir().join(".config").join("codepick"))
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    Ok(resolve_config_dir()?.join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<CodepickConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: CodepickConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

pub fn parse_catalog_source(catalog: &CatalogConfig) -> Result<CatalogSource, ConfigError> {
    match catalog.source {
        CatalogSourceKind::Http => {
            let url = catalog
                .url
                .clone()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| invalid("catalog source \"http\" requires non-empty url"))?;
            validate_url("catalog.url", &url)?;
            if catalog.timeout_secs == 0 {
                return Err(invalid("catalog.timeout_secs must be at least 1"));
            }
            Ok(CatalogSource::Http {
                url,
                timeout: Duration::from_secs(catalog.timeout_secs),
            })
        }
        CatalogSourceKind::File => {
            let path = catalog
                .path
                .clone()
                .filter(|value| !value.as_os_str().is_empty())
                .ok_or_else(|| invalid("catalog source \"file\" requires non-empty path"))?;
            Ok(CatalogSource::File { path })
        }
    }
}

pub fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(value)
        .map_err(|error| invalid(format!("{field} is not a valid URL: {error}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "{field} must use http or https, got {}",
            parsed.scheme()
        )));
    }

    Ok(())
}

pub fn validate_config(config: &CodepickConfig) -> Result<(), ConfigError> {
    if config.version != 1 {
        return Err(invalid("version must be 1"));
    }

    if config.engine.url.trim().is_empty() {
        return Err(invalid("engine.url must be non-empty"));
    }
    validate_url("engine.url", &config.engine.url)?;

    if config.engine.timeout_secs == 0 {
        return Err(invalid("engine.timeout_secs must be at least 1"));
    }

    if config.catalog.limit == 0 || config.catalog.limit > MAX_LOOKUP_LIMIT {
        return Err(invalid(format!(
            "catalog.limit must be between 1 and {MAX_LOOKUP_LIMIT}"
        )));
    }

    parse_catalog_source(&config.catalog)?;

    if config.submit.sink == SinkKind::Directory
        && config
            .submit
            .output_dir
            .as_ref()
            .is_none_or(|path| path.as_os_str().is_empty())
    {
        return Err(invalid("submit sink \"directory\" requires output_dir"));
    }

    Ok(())
}
