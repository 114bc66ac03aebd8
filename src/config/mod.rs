//! Service config loader (strict YAML parsing + validation).

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{AppError, Result};

pub use schema::{AppConfig, DemoSection, MetricsSection, ServerSection};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "HEALTH_WINDOW_CONFIG";
/// Used when `CONFIG_PATH_ENV` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "health-window.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("read {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s)
        .map_err(|e| AppError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config for this process.
///
/// An explicitly named file must exist. The default file is optional; when it
/// is absent the built-in defaults apply.
pub fn load_from_env() -> Result<AppConfig> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_from_file(path),
        Err(_) => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(s) => load_from_str(&s),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    path = DEFAULT_CONFIG_PATH,
                    "no config file found, using defaults"
                );
                Ok(AppConfig::default())
            }
            Err(e) => Err(AppError::Config(format!(
                "read {DEFAULT_CONFIG_PATH} failed: {e}"
            ))),
        },
    }
}
