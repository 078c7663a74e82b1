//! Layered configuration loading: defaults, then YAML, then environment.
//!
//! # Design
//! - Environment lookups go through a closure so tests never mutate process state.
//! - Validation runs once, after every layer has been applied.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{GafferConfig, LoginMode};
use crate::validate::validate;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "GAFFER_CONFIG";

/// Load configuration from an optional YAML file and the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an override is malformed, or
/// the merged configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<GafferConfig> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// Load configuration using a caller-supplied environment lookup.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> ConfigResult<GafferConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let env_path = lookup(CONFIG_ENV).map(PathBuf::from);
    let path = path.map(Path::to_path_buf).or(env_path);

    let mut config = match &path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                operation: "config.read",
                path: path.clone(),
                source,
            })?;
            parse_yaml(&text, Some(path))?
        }
        None => GafferConfig::default(),
    };
    debug!(path = ?path, "configuration document loaded");

    apply_env_overrides(&mut config, &lookup)?;
    validate(&config)?;
    Ok(config)
}

/// Parse and validate a YAML document without consulting the environment.
///
/// # Errors
///
/// Returns an error if the document is malformed or fails validation.
pub fn from_yaml_str(text: &str) -> ConfigResult<GafferConfig> {
    let config = parse_yaml(text, None)?;
    validate(&config)?;
    Ok(config)
}

fn parse_yaml(text: &str, path: Option<&Path>) -> ConfigResult<GafferConfig> {
    if text.trim().is_empty() {
        return Ok(GafferConfig::default());
    }
    serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.map(Path::to_path_buf),
        source,
    })
}

fn apply_env_overrides<F>(config: &mut GafferConfig, lookup: &F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(value) = read("GAFFER_PROFILE_DIR") {
        config.storage.profile_dir = PathBuf::from(value);
    }
    if let Some(value) = read("GAFFER_ARTIFACTS_DIR") {
        config.storage.artifacts_dir = PathBuf::from(value);
    }
    if let Some(value) = read("GAFFER_DOWNLOAD_DIR") {
        config.transfer.download_dir = PathBuf::from(value);
    }
    if let Some(value) = read("GAFFER_ASCP_PATH") {
        config.transfer.ascp_path = Some(PathBuf::from(value));
    }
    if let Some(value) = read("GAFFER_ASCP_KEY") {
        config.transfer.key_path = Some(PathBuf::from(value));
    }
    if let Some(value) = read("GAFFER_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Some(value) = read("GAFFER_LOG_FORMAT") {
        if !matches!(value.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidEnv {
                name: "GAFFER_LOG_FORMAT",
                value,
                reason: "must be json or pretty",
            });
        }
        config.logging.format = Some(value);
    }
    if let Some(value) = read("GAFFER_LOG_DIR") {
        config.logging.directory = Some(PathBuf::from(value));
    }
    if let Some(value) = read("GAFFER_NOTIFY_URL") {
        config.notify.url = Some(value);
    }
    if let Some(value) = read("GAFFER_LOGIN_COMMAND") {
        let command: Vec<String> = value.split_whitespace().map(str::to_string).collect();
        config.login.mode = LoginMode::Command;
        config.login.command = command;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::error::Error;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn no_file_yields_defaults() -> Result<(), Box<dyn Error>> {
        let config = load_with_env(None, env(&[]))?;
        assert_eq!(config, GafferConfig::default());
        Ok(())
    }

    #[test]
    fn env_overrides_apply_after_defaults() -> Result<(), Box<dyn Error>> {
        let config = load_with_env(
            None,
            env(&[
                ("GAFFER_DOWNLOAD_DIR", "/mnt/deliveries"),
                ("GAFFER_LOG_FORMAT", "json"),
                ("GAFFER_LOGIN_COMMAND", "capture-cookies --headless"),
            ]),
        )?;
        assert_eq!(config.transfer.download_dir, PathBuf::from("/mnt/deliveries"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.login.mode, LoginMode::Command);
        assert_eq!(config.login.command, vec!["capture-cookies", "--headless"]);
        Ok(())
    }

    #[test]
    fn bad_log_format_override_is_rejected() {
        let result = load_with_env(None, env(&[("GAFFER_LOG_FORMAT", "xml")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv {
                name: "GAFFER_LOG_FORMAT",
                ..
            })
        ));
    }

    #[test]
    fn yaml_sections_merge_with_defaults() -> Result<(), Box<dyn Error>> {
        let config = from_yaml_str(
            "portal:\n  base_url: https://portal.example\nlogin:\n  timeout_secs: 60\n",
        )?;
        assert_eq!(config.portal.base_url, "https://portal.example");
        assert_eq!(config.login.timeout_secs, 60);
        assert_eq!(config.portal.request_limit, 25_000);
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = from_yaml_str("portal:\n  base_uri: https://portal.example\n");
        assert!(matches!(result, Err(ConfigError::Parse { path: None, .. })));
    }

    #[test]
    fn empty_document_is_default() -> Result<(), Box<dyn Error>> {
        assert_eq!(from_yaml_str("  \n")?, GafferConfig::default());
        Ok(())
    }
}
