//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` returns the value of a variable, if set.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("PORT") {
        let port = value.trim().parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            value: value.clone(),
        })?;
        config.listener.port = Some(port);
    }

    if let Some(value) = lookup("CHIA_ROOT").filter(|v| !v.is_empty()) {
        config.rpc.chia_root = Some(PathBuf::from(value));
    }

    if let Some(value) = lookup("RPC_URL").filter(|v| !v.is_empty()) {
        config.rpc.url = Some(value);
    }

    if let Some(value) = lookup("RPC_CACHE_TTL_SECS") {
        let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Env {
            var: "RPC_CACHE_TTL_SECS",
            value: value.clone(),
        })?;
        config.rpc.cache_ttl_secs = (secs > 0).then_some(secs);
    }

    if let Some(value) = lookup("SERVICE_NAME").filter(|v| !v.is_empty()) {
        config.telemetry.service_name = Some(value);
    }

    if let Some(value) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()) {
        config.telemetry.collector_url = Some(value);
    }

    if let Some(value) = lookup("INSECURE_MODE") {
        config.telemetry.insecure = !value.is_empty();
    }

    if let Some(value) = lookup("LOG_LEVEL").filter(|v| !v.is_empty()) {
        config.telemetry.log_level = value;
    }

    if let Some(value) = lookup("JSON_LOGS") {
        config.telemetry.json_logs = value.eq_ignore_ascii_case("true") || value == "1";
    }

    if let Some(value) = lookup("METRICS_ADDRESS").filter(|v| !v.is_empty()) {
        config.metrics.enabled = true;
        config.metrics.address = value;
    }

    Ok(())
}
