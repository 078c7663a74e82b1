//! Interactive login collaborators.
//!
//! # Design
//! - The browser flow lives outside this crate; a collaborator only has to hand back
//!   the cookie jar captured for the redirect target.
//! - `CommandLogin` delegates to a helper program, `PromptLogin` to a human pasting a
//!   `Cookie` header. The caller bounds both with the configured timeout.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use gaffer_config::{LoginConfig, LoginMode};
use gaffer_core::StoredCookie;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;

use crate::endpoints::host_of;
use crate::error::{PortalError, PortalResult};

/// What the collaborator needs to run one login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    /// Fully parameterised authorize URL to open.
    pub authorize_url: Url,
    /// Target whose cookies make up the session.
    pub redirect_target: Url,
}

/// Produces a cookie jar for a redirect target.
#[async_trait]
pub trait InteractiveLogin: Send + Sync {
    /// Run the login and return the captured cookies.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Login`] or [`PortalError::Io`] when no jar could be captured.
    async fn login(&self, request: &LoginRequest) -> PortalResult<Vec<StoredCookie>>;
}

/// Build the collaborator selected by configuration.
///
/// # Errors
///
/// Returns [`PortalError::Login`] when command mode has no program configured.
pub fn login_from_config(config: &LoginConfig) -> PortalResult<Arc<dyn InteractiveLogin>> {
    match config.mode {
        LoginMode::Command => {
            let login = CommandLogin::from_argv(&config.command).ok_or_else(|| PortalError::Login {
                operation: "login.configure",
                detail: "command mode requires a helper program".to_string(),
            })?;
            Ok(Arc::new(login))
        }
        LoginMode::Prompt => Ok(Arc::new(PromptLogin::new(config.opener.clone()))),
    }
}

/// Runs a helper that prints the captured jar as JSON on stdout.
///
/// The helper receives the authorize URL and the redirect target as its last two
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLogin {
    program: String,
    args: Vec<String>,
}

impl CommandLogin {
    /// Helper program with leading arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split an argv vector; `None` when it is empty.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        (!program.trim().is_empty()).then(|| Self::new(program.clone(), args.to_vec()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HelperOutput {
    Jar(Vec<StoredCookie>),
    Wrapped { cookies: Vec<StoredCookie> },
}

#[async_trait]
impl InteractiveLogin for CommandLogin {
    async fn login(&self, request: &LoginRequest) -> PortalResult<Vec<StoredCookie>> {
        info!(program = %self.program, "running login helper");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(request.authorize_url.as_str())
            .arg(request.redirect_target.as_str())
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| PortalError::Io {
                operation: "login.spawn",
                path: Some(self.program.clone().into()),
                source,
            })?;

        if !output.status.success() {
            return Err(PortalError::Login {
                operation: "login.command",
                detail: format!("helper exited with {}", output.status),
            });
        }

        let parsed: HelperOutput =
            serde_json::from_slice(&output.stdout).map_err(|source| PortalError::Json {
                operation: "login.helper_output",
                source,
            })?;
        let cookies = match parsed {
            HelperOutput::Jar(cookies) | HelperOutput::Wrapped { cookies } => cookies,
        };
        if cookies.is_empty() {
            return Err(PortalError::Login {
                operation: "login.command",
                detail: "helper returned an empty cookie jar".to_string(),
            });
        }
        Ok(cookies)
    }
}

/// Opens the authorize URL and reads a pasted `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptLogin {
    opener: Option<String>,
}

impl PromptLogin {
    /// Prompt collaborator; `opener` is the program used to open the URL.
    #[must_use]
    pub const fn new(opener: Option<String>) -> Self {
        Self { opener }
    }
}

#[async_trait]
impl InteractiveLogin for PromptLogin {
    async fn login(&self, request: &LoginRequest) -> PortalResult<Vec<StoredCookie>> {
        match &self.opener {
            Some(opener) => match Command::new(opener)
                .arg(request.authorize_url.as_str())
                .status()
                .await
            {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(opener = %opener, %status, "opener exited unsuccessfully"),
                Err(err) => warn!(opener = %opener, error = %err, "failed to launch opener"),
            },
            None => eprintln!("Open this URL to log in:\n  {}", request.authorize_url),
        }

        let prompt = format!(
            "Paste the Cookie header sent to {} after login: ",
            request.redirect_target
        );
        let header = tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt))
            .await
            .map_err(|err| PortalError::Login {
                operation: "login.prompt",
                detail: err.to_string(),
            })?
            .map_err(|source| PortalError::Io {
                operation: "login.prompt",
                path: None,
                source,
            })?;

        let cookies = parse_cookie_header(&header, host_of(&request.redirect_target));
        if cookies.is_empty() {
            return Err(PortalError::Login {
                operation: "login.prompt",
                detail: "no cookies in pasted header".to_string(),
            });
        }
        Ok(cookies)
    }
}

/// Parse a `Cookie` header (`a=1; b=2`) into cookies scoped to `domain`.
///
/// A leading `Cookie:` label is tolerated; pairs without `=` or a name are skipped.
#[must_use]
pub fn parse_cookie_header(header: &str, domain: &str) -> Vec<StoredCookie> {
    let header = header.trim();
    let header = header
        .get(..7)
        .filter(|label| label.eq_ignore_ascii_case("cookie:"))
        .map_or(header, |_| &header[7..]);
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let cookie = StoredCookie::new(name, value.trim());
            Some(if domain.is_empty() {
                cookie
            } else {
                cookie.with_domain(domain)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PortalResult<LoginRequest> {
        Ok(LoginRequest {
            authorize_url: crate::endpoints::parse("https://sso.example/authorize?state=x")?,
            redirect_target: crate::endpoints::parse("https://portal.example/meechum")?,
        })
    }

    #[test]
    fn cookie_header_is_split_and_scoped() {
        let cookies = parse_cookie_header("Cookie: sid=abc; csrf = t=1 ;broken; =x", "portal.example");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "sid");
        assert_eq!(cookies[0].value, "abc");
        assert_eq!(cookies[1].name, "csrf");
        assert_eq!(cookies[1].value, "t=1");
        assert!(cookies.iter().all(|c| c.domain.as_deref() == Some("portal.example")));
        assert!(parse_cookie_header("  ", "portal.example").is_empty());
    }

    #[test]
    fn argv_splits_program_from_args() {
        let argv = vec!["capture".to_string(), "--headless".to_string()];
        let login = CommandLogin::from_argv(&argv);
        assert_eq!(
            login,
            Some(CommandLogin::new("capture", vec!["--headless".to_string()]))
        );
        assert!(CommandLogin::from_argv(&[]).is_none());
    }

    #[test]
    fn command_mode_without_program_fails_to_configure() {
        let config = LoginConfig {
            mode: LoginMode::Command,
            ..LoginConfig::default()
        };
        assert!(matches!(
            login_from_config(&config),
            Err(PortalError::Login { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn helper_stdout_becomes_the_jar() -> anyhow::Result<()> {
        let script = r#"printf '[{"name":"sid","value":"fresh","domain":".portal.example","secure":true}]'"#;
        let login = CommandLogin::new("sh", vec!["-c".to_string(), script.to_string(), "helper".to_string()]);
        let cookies = login.login(&request()?).await?;
        assert_eq!(cookies, vec![StoredCookie::new("sid", "fresh").with_domain(".portal.example")]);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn helper_receives_urls_as_trailing_arguments() -> anyhow::Result<()> {
        let script = r#"printf '{"cookies":[{"name":"redirect","value":"%s"}]}' "$2""#;
        let login = CommandLogin::new("sh", vec!["-c".to_string(), script.to_string(), "helper".to_string()]);
        let cookies = login.login(&request()?).await?;
        assert_eq!(cookies[0].value, "https://portal.example/meechum");
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_helper_is_a_login_error() -> anyhow::Result<()> {
        let login = CommandLogin::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        let result = login.login(&request()?).await;
        assert!(matches!(result, Err(PortalError::Login { operation: "login.command", .. })));
        Ok(())
    }
}
