//! Typed configuration sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GafferConfig {
    /// Catalog portal endpoints and query defaults.
    pub portal: PortalConfig,
    /// OAuth authorize parameters.
    pub oauth: OAuthConfig,
    /// Interactive login collaborator.
    pub login: LoginConfig,
    /// HTTP client timeouts and identity.
    pub http: HttpConfig,
    /// Local state locations.
    pub storage: StorageConfig,
    /// External transfer client.
    pub transfer: TransferConfig,
    /// Logging output.
    pub logging: LoggingSettings,
    /// Optional failure notification hook.
    pub notify: NotifyConfig,
}

/// Catalog portal endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalConfig {
    /// Portal base URL.
    pub base_url: String,
    /// Streaming subscription endpoint.
    pub gateway_url: String,
    /// Source type filter for request search.
    pub source_type: String,
    /// Request-search page size.
    pub request_limit: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::PORTAL_BASE_URL.to_string(),
            gateway_url: defaults::GATEWAY_URL.to_string(),
            source_type: defaults::SOURCE_TYPE.to_string(),
            request_limit: defaults::REQUEST_LIMIT,
        }
    }
}

impl PortalConfig {
    /// OAuth redirect target whose cookies make up the session.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        format!("{}/meechum", self.base_url.trim_end_matches('/'))
    }

    /// Endpoint exchanging the session cookies for a bearer token.
    #[must_use]
    pub fn info_url(&self) -> String {
        format!("{}?info=json", self.redirect_url())
    }

    /// Request-search endpoint.
    #[must_use]
    pub fn request_search_url(&self) -> String {
        format!("{}/api/sourceRequests", self.base_url.trim_end_matches('/'))
    }
}

/// OAuth authorize parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    /// Authorization endpoint.
    pub authorize_url: String,
    /// Client identifier.
    pub client_id: String,
    /// Scope list, `+`-separated.
    pub scope: String,
    /// Authentication strategy hint.
    pub auth_strategy: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorize_url: defaults::AUTHORIZE_URL.to_string(),
            client_id: defaults::CLIENT_ID.to_string(),
            scope: defaults::SCOPE.to_string(),
            auth_strategy: defaults::AUTH_STRATEGY.to_string(),
        }
    }
}

/// How the interactive login collaborator is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMode {
    /// Run a helper program that prints the captured cookie jar as JSON.
    Command,
    /// Open the authorize URL and read a pasted `Cookie` header.
    #[default]
    Prompt,
}

/// Interactive login collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoginConfig {
    /// Collaborator flavour.
    pub mode: LoginMode,
    /// Helper program and leading arguments for [`LoginMode::Command`].
    pub command: Vec<String>,
    /// Program used to open the authorize URL in [`LoginMode::Prompt`].
    pub opener: Option<String>,
    /// Upper bound on the wait for the human to finish logging in.
    pub timeout_secs: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            mode: LoginMode::default(),
            command: Vec::new(),
            opener: None,
            timeout_secs: defaults::LOGIN_TIMEOUT_SECS,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Timeout for JSON requests.
    pub request_timeout_secs: u64,
    /// Timeout for subscription streams.
    pub stream_timeout_secs: u64,
    /// User agent header.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            stream_timeout_secs: defaults::STREAM_TIMEOUT_SECS,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

/// Local state locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the persisted session.
    pub profile_dir: PathBuf,
    /// Directory receiving per-title artifacts.
    pub artifacts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profile_dir: PathBuf::from(defaults::PROFILE_DIR),
            artifacts_dir: PathBuf::from(defaults::ARTIFACTS_DIR),
        }
    }
}

impl StorageConfig {
    /// Path of the persisted session blob.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.profile_dir.join(defaults::SESSION_FILE)
    }
}

/// External transfer client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferConfig {
    /// When `false`, runs stop after manifest resolution.
    pub enabled: bool,
    /// Download root.
    pub download_dir: PathBuf,
    /// Transfer binary; resolved per OS when absent.
    pub ascp_path: Option<PathBuf>,
    /// Transfer identity key; resolved per OS when absent.
    pub key_path: Option<PathBuf>,
    /// Fallback transfer user.
    pub user: String,
    /// Overwrite policy.
    pub overwrite: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            download_dir: PathBuf::from(defaults::DOWNLOAD_DIR),
            ascp_path: None,
            key_path: None,
            user: defaults::TRANSFER_USER.to_string(),
            overwrite: defaults::OVERWRITE_POLICY.to_string(),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Level directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `json` or `pretty`; inferred from the build when absent.
    pub format: Option<String>,
    /// Directory for rolling `general.log`/`error.log` files.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
            directory: None,
        }
    }
}

/// Failure notification hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Webhook receiving per-title outcome events.
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_portal_urls() {
        let portal = PortalConfig {
            base_url: "https://portal.example/".to_string(),
            ..PortalConfig::default()
        };
        assert_eq!(portal.redirect_url(), "https://portal.example/meechum");
        assert_eq!(portal.info_url(), "https://portal.example/meechum?info=json");
        assert_eq!(
            portal.request_search_url(),
            "https://portal.example/api/sourceRequests"
        );
    }

    #[test]
    fn session_file_lives_in_profile_dir() {
        let storage = StorageConfig::default();
        assert_eq!(
            storage.session_file(),
            PathBuf::from("./profile").join("session.json")
        );
    }
}
