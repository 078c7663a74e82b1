//! Session validation and token exchange.
//!
//! # Design
//! - `ensure_valid` does no work for a session that is already valid.
//! - A restored session is checked against the info endpoint before any login runs; an
//!   expired session goes straight to interactive login.
//! - Only a rejected check leads to login. A check that cannot reach the portal fails
//!   the call instead.
//! - The bearer token is never cached across calls; callers derive it right before a
//!   bearer-authenticated request.

use std::sync::Arc;
use std::time::Duration;

use gaffer_config::OAuthConfig;
use gaffer_core::{AccessToken, Session, SessionEvent, SessionState};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::credentials::CredentialStore;
use crate::endpoints::PortalEndpoints;
use crate::error::{PortalError, PortalResult};
use crate::http::PortalClient;
use crate::login::{InteractiveLogin, LoginRequest};

const STATE_LENGTH: usize = 32;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Keeps a [`Session`] valid and exchanges it for bearer tokens.
pub struct SessionAuthenticator {
    http: PortalClient,
    endpoints: PortalEndpoints,
    oauth: OAuthConfig,
    login: Arc<dyn InteractiveLogin>,
    store: Arc<dyn CredentialStore>,
    login_timeout: Duration,
}

impl SessionAuthenticator {
    /// Wire the authenticator to its collaborators.
    #[must_use]
    pub fn new(
        http: PortalClient,
        endpoints: PortalEndpoints,
        oauth: &OAuthConfig,
        login: Arc<dyn InteractiveLogin>,
        store: Arc<dyn CredentialStore>,
        login_timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoints,
            oauth: oauth.clone(),
            login,
            store,
            login_timeout,
        }
    }

    /// Session from the credential store, or an empty one.
    #[must_use]
    pub fn restore(&self) -> Session {
        self.store.restore()
    }

    /// Redirect target handed to the login collaborator.
    #[must_use]
    pub const fn redirect_target(&self) -> &Url {
        &self.endpoints.redirect_target
    }

    /// Authorize URL with fresh `state` and `nonce` values.
    #[must_use]
    pub fn authorize_url(&self) -> Url {
        let mut url = self.endpoints.authorize.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.oauth.client_id)
            .append_pair("scope", &self.oauth.scope)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.endpoints.redirect_target.as_str())
            .append_pair("state", &random_string(STATE_LENGTH))
            .append_pair("nonce", &random_string(STATE_LENGTH))
            .append_pair("auth_strategy", &self.oauth.auth_strategy);
        url
    }

    /// Make `session` valid, running interactive login only when needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the login collaborator fails or times out, or when the
    /// check of a restored session fails for any reason other than a rejection.
    pub async fn ensure_valid(&self, session: &mut Session) -> PortalResult<()> {
        if session.is_valid() {
            debug!("session already valid");
            return Ok(());
        }

        if session.state() == SessionState::Unauthenticated && session.has_cookies() {
            match self.access_token(session).await {
                Ok(token) => {
                    session.set_token(token);
                    session.apply(SessionEvent::LoginSucceeded);
                    info!("stored session accepted");
                    return Ok(());
                }
                Err(err) if err.is_authorization_failure() => {
                    warn!(error = %err, "stored session rejected; logging in again");
                }
                Err(err) => return Err(err),
            }
        }

        self.run_login(session).await
    }

    /// Exchange the session cookies for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::AccessToken`] when no token is handed out and
    /// [`PortalError::Unauthorized`] when the endpoint refuses the cookies.
    pub async fn access_token(&self, session: &Session) -> PortalResult<AccessToken> {
        let url = &self.endpoints.info;
        let response = self
            .http
            .send("access_token", url, self.http.get(url, session))
            .await?;
        let body = response.bytes().await.map_err(|source| PortalError::Http {
            operation: "access_token",
            url: url.to_string(),
            source,
        })?;

        let info = match serde_json::from_slice::<InfoResponse>(&body) {
            Ok(info) => info,
            Err(err) => {
                debug!(error = %err, "info endpoint did not answer with JSON");
                return Err(PortalError::AccessToken {
                    url: url.to_string(),
                });
            }
        };
        info.access_token
            .filter(|token| !token.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| PortalError::AccessToken {
                url: url.to_string(),
            })
    }

    async fn run_login(&self, session: &mut Session) -> PortalResult<()> {
        let request = LoginRequest {
            authorize_url: self.authorize_url(),
            redirect_target: self.endpoints.redirect_target.clone(),
        };
        let timeout_secs = self.login_timeout.as_secs();
        info!(
            redirect_target = %request.redirect_target,
            timeout_secs,
            state = session.state().as_str(),
            "starting interactive login"
        );

        let cookies = tokio::time::timeout(self.login_timeout, self.login.login(&request))
            .await
            .map_err(|_| PortalError::LoginTimeout { timeout_secs })??;
        if cookies.is_empty() {
            return Err(PortalError::Login {
                operation: "login.capture",
                detail: "collaborator returned no cookies".to_string(),
            });
        }

        session.absorb_cookies(cookies);
        session.apply(SessionEvent::LoginSucceeded);
        info!(cookies = session.cookies().len(), "interactive login succeeded");

        if let Err(err) = self.store.persist(session) {
            warn!(error = %err, "failed to persist session");
        }
        Ok(())
    }
}

/// Random alphanumeric string of the requested length.
#[must_use]
pub fn random_string(len: usize) -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(len)
        .collect()
}

#[cfg(test)]
#[allow(deprecated, reason = "httpmock 0.8 deprecates `hits`")]
mod tests {
    use super::*;
    use crate::credentials::FileCredentialStore;
    use crate::testing::{
        RecordingLogin, SlowLogin, authenticator, authenticator_with, base_config,
    };
    use anyhow::Result;
    use gaffer_core::StoredCookie;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn random_string_produces_expected_length() {
        let generated = random_string(16);
        assert_eq!(generated.len(), 16);
        assert!(generated.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn authorize_url_carries_oauth_parameters() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let auth = authenticator(&server, RecordingLogin::shared("sid", "x"), dir.path())?;

        let url = auth.authorize_url();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], base_config(&server).oauth.client_id);
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], server.url("/meechum"));
        assert_eq!(params["state"].len(), 32);
        assert_eq!(params["nonce"].len(), 32);
        assert_ne!(params["state"], params["nonce"]);
        assert!(params["scope"].contains('+'));
        Ok(())
    }

    #[tokio::test]
    async fn ensure_valid_is_idempotent() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let auth = authenticator(&server, login.clone(), dir.path())?;

        let mut session = Session::new();
        auth.ensure_valid(&mut session).await?;
        auth.ensure_valid(&mut session).await?;

        assert_eq!(login.calls(), 1);
        assert!(session.is_valid());
        let stored = FileCredentialStore::new(dir.path().join("session.json")).restore();
        assert_eq!(stored.cookies(), session.cookies());
        Ok(())
    }

    #[tokio::test]
    async fn restored_session_is_checked_before_login() -> Result<()> {
        let server = MockServer::start_async().await;
        let info = server.mock(|when, then| {
            when.method(GET)
                .path("/meechum")
                .query_param("info", "json")
                .header("cookie", "sid=stored");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "access_token": "bearer-1" }));
        });
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let auth = authenticator(&server, login.clone(), dir.path())?;

        let mut session = Session::from_cookies(vec![StoredCookie::new("sid", "stored")]);
        auth.ensure_valid(&mut session).await?;

        info.assert();
        assert_eq!(login.calls(), 0);
        assert!(session.is_valid());
        assert_eq!(session.token().map(AccessToken::expose), Some("bearer-1"));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_restored_session_triggers_login() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/meechum").query_param("info", "json");
            then.status(401);
        });
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let auth = authenticator(&server, login.clone(), dir.path())?;

        let mut session = Session::from_cookies(vec![StoredCookie::new("sid", "stale")]);
        auth.ensure_valid(&mut session).await?;

        assert_eq!(login.calls(), 1);
        assert!(session.is_valid());
        assert_eq!(session.cookies()[0].value, "fresh");
        Ok(())
    }

    #[tokio::test]
    async fn failing_check_does_not_open_a_login() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/meechum").query_param("info", "json");
            then.status(502);
        });
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let auth = authenticator(&server, login.clone(), dir.path())?;

        let mut session = Session::from_cookies(vec![StoredCookie::new("sid", "stale")]);
        let result = auth.ensure_valid(&mut session).await;

        assert!(matches!(result, Err(PortalError::Status { status: 502, .. })));
        assert_eq!(login.calls(), 0);
        assert_eq!(session.state(), SessionState::Unauthenticated);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_portal_during_check_is_propagated() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let mut config = base_config(&server);
        config.portal.base_url = "http://127.0.0.1:9".to_string();
        config.storage.profile_dir = dir.path().to_path_buf();
        let login = RecordingLogin::shared("sid", "fresh");
        let auth = authenticator_with(&config, login.clone(), Duration::from_secs(5))?;

        let mut session = Session::from_cookies(vec![StoredCookie::new("sid", "stale")]);
        let result = auth.ensure_valid(&mut session).await;

        assert!(matches!(result, Err(PortalError::Http { .. })));
        assert_eq!(login.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn expired_session_skips_the_check() -> Result<()> {
        let server = MockServer::start_async().await;
        let info = server.mock(|when, then| {
            when.method(GET).path("/meechum").query_param("info", "json");
            then.status(200)
                .json_body(serde_json::json!({ "access_token": "unused" }));
        });
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let auth = authenticator(&server, login.clone(), dir.path())?;

        let mut session = Session::from_cookies(vec![StoredCookie::new("sid", "old")]);
        session.apply(SessionEvent::LoginSucceeded);
        session.apply(SessionEvent::AuthorizationRejected);
        auth.ensure_valid(&mut session).await?;

        assert_eq!(info.hits(), 0);
        assert_eq!(login.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_token_field_is_an_access_token_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/meechum").header("cookie", "sid=json");
            then.status(200).json_body(serde_json::json!({ "user": "someone" }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/meechum").header("cookie", "sid=html");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html>login</html>");
        });
        let dir = TempDir::new()?;
        let auth = authenticator(&server, RecordingLogin::shared("sid", "x"), dir.path())?;

        for value in ["json", "html"] {
            let session = Session::from_cookies(vec![StoredCookie::new("sid", value)]);
            let result = auth.access_token(&session).await;
            assert!(matches!(result, Err(PortalError::AccessToken { .. })));
        }
        Ok(())
    }

    #[tokio::test]
    async fn login_wait_is_bounded() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let mut config = base_config(&server);
        config.storage.profile_dir = dir.path().to_path_buf();
        let auth = crate::testing::authenticator_with(
            &config,
            Arc::new(SlowLogin),
            Duration::from_millis(50),
        )?;

        let mut session = Session::new();
        let result = auth.ensure_valid(&mut session).await;
        assert!(matches!(result, Err(PortalError::LoginTimeout { .. })));
        assert!(!session.is_valid());
        Ok(())
    }
}
