//! Validation helpers for loaded configuration.

use url::Url;

use crate::defaults::OVERWRITE_POLICIES;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{GafferConfig, LoginMode};

/// Check every section of a loaded configuration.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidField`] encountered.
pub fn validate(config: &GafferConfig) -> ConfigResult<()> {
    validate_url("portal", "base_url", &config.portal.base_url)?;
    validate_url("portal", "gateway_url", &config.portal.gateway_url)?;
    validate_url("oauth", "authorize_url", &config.oauth.authorize_url)?;
    if let Some(url) = &config.notify.url {
        validate_url("notify", "url", url)?;
    }

    if config.portal.request_limit == 0 {
        return Err(ConfigError::invalid(
            "portal",
            "request_limit",
            "must be positive",
            None,
        ));
    }
    if config.portal.source_type.trim().is_empty() {
        return Err(ConfigError::invalid(
            "portal",
            "source_type",
            "must not be empty",
            None,
        ));
    }
    if config.oauth.client_id.trim().is_empty() {
        return Err(ConfigError::invalid(
            "oauth",
            "client_id",
            "must not be empty",
            None,
        ));
    }

    validate_timeout("login", "timeout_secs", config.login.timeout_secs)?;
    validate_timeout("http", "request_timeout_secs", config.http.request_timeout_secs)?;
    validate_timeout("http", "stream_timeout_secs", config.http.stream_timeout_secs)?;

    if config.login.mode == LoginMode::Command
        && config
            .login
            .command
            .first()
            .is_none_or(|program| program.trim().is_empty())
    {
        return Err(ConfigError::invalid(
            "login",
            "command",
            "required when mode is command",
            None,
        ));
    }

    if !OVERWRITE_POLICIES.contains(&config.transfer.overwrite.as_str()) {
        return Err(ConfigError::invalid(
            "transfer",
            "overwrite",
            "unsupported overwrite policy",
            Some(config.transfer.overwrite.clone()),
        ));
    }
    if config.transfer.user.trim().is_empty() {
        return Err(ConfigError::invalid(
            "transfer",
            "user",
            "must not be empty",
            None,
        ));
    }

    if let Some(format) = &config.logging.format
        && !matches!(format.as_str(), "json" | "pretty")
    {
        return Err(ConfigError::invalid(
            "logging",
            "format",
            "must be json or pretty",
            Some(format.clone()),
        ));
    }

    Ok(())
}

fn validate_url(section: &'static str, field: &'static str, value: &str) -> ConfigResult<()> {
    let parsed = Url::parse(value)
        .map_err(|_| ConfigError::invalid(section, field, "invalid URL", Some(value.to_string())))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::invalid(
            section,
            field,
            "must be an absolute http(s) URL",
            Some(value.to_string()),
        ));
    }
    Ok(())
}

const fn validate_timeout(section: &'static str, field: &'static str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::InvalidField {
            section,
            field,
            reason: "must be positive",
            value: None,
        });
    }
    Ok(())
}
