//! Shared session context and the retry policy for protected calls.
//!
//! # Design
//! - The session lives behind one async mutex; it is held only while the session is
//!   validated, never across the protected request itself.
//! - A protected call that fails authorization expires the session, re-validates it and
//!   is retried exactly once. A second authorization failure propagates.

use std::future::Future;

use gaffer_core::{AccessToken, Session, SessionEvent};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::SessionAuthenticator;
use crate::error::{PortalError, PortalResult};

/// How a protected call authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Session cookies only.
    Cookies,
    /// Session cookies plus a freshly derived bearer token.
    Bearer,
}

/// Snapshot handed to a protected call.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Validated session.
    pub session: Session,
    /// Bearer token, present for [`AuthScheme::Bearer`] calls.
    pub token: Option<AccessToken>,
}

impl Credentials {
    /// Bearer token, or an error when the call was not set up for bearer auth.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::AccessToken`] when no token was derived.
    pub fn bearer(&self) -> PortalResult<&AccessToken> {
        self.token.as_ref().ok_or_else(|| PortalError::AccessToken {
            url: String::new(),
        })
    }
}

/// Process-wide session plus the authenticator that maintains it.
pub struct SessionContext {
    session: Mutex<Session>,
    auth: SessionAuthenticator,
}

impl SessionContext {
    /// Context starting from `session`.
    #[must_use]
    pub fn new(auth: SessionAuthenticator, session: Session) -> Self {
        Self {
            session: Mutex::new(session),
            auth,
        }
    }

    /// Context starting from whatever the credential store holds.
    #[must_use]
    pub fn restore(auth: SessionAuthenticator) -> Self {
        let session = auth.restore();
        Self::new(auth, session)
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Run `call` with valid credentials, re-authenticating once on rejection.
    ///
    /// # Errors
    ///
    /// Returns the call's error, or the authentication error that prevented it.
    pub async fn protected<T, F, Fut>(
        &self,
        operation: &'static str,
        scheme: AuthScheme,
        call: F,
    ) -> PortalResult<T>
    where
        F: Fn(Credentials) -> Fut,
        Fut: Future<Output = PortalResult<T>>,
    {
        match self.attempt(scheme, &call).await {
            Err(err) if err.is_authorization_failure() => {
                warn!(operation, error = %err, "authorization rejected; re-authenticating once");
                self.session
                    .lock()
                    .await
                    .apply(SessionEvent::AuthorizationRejected);
                self.attempt(scheme, &call).await
            }
            outcome => outcome,
        }
    }

    async fn attempt<T, F, Fut>(&self, scheme: AuthScheme, call: &F) -> PortalResult<T>
    where
        F: Fn(Credentials) -> Fut,
        Fut: Future<Output = PortalResult<T>>,
    {
        let session = {
            let mut guard = self.session.lock().await;
            self.auth.ensure_valid(&mut guard).await?;
            guard.clone()
        };
        let token = match scheme {
            AuthScheme::Cookies => None,
            AuthScheme::Bearer => {
                let token = self.auth.access_token(&session).await?;
                debug!("bearer token derived");
                Some(token)
            }
        };
        call(Credentials { session, token }).await
    }
}

#[cfg(test)]
#[allow(deprecated, reason = "httpmock 0.8 deprecates `hits`")]
mod tests {
    use super::*;
    use crate::testing::{RecordingLogin, authenticator};
    use anyhow::Result;
    use gaffer_core::SessionState;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn rejected() -> PortalError {
        PortalError::Unauthorized {
            operation: "lookup",
            url: "https://portal.example".to_string(),
            status: 401,
        }
    }

    #[tokio::test]
    async fn rejection_triggers_one_login_and_one_retry() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let mut initial = Session::new();
        initial.apply(SessionEvent::LoginSucceeded);
        let context = SessionContext::new(authenticator(&server, login.clone(), dir.path())?, initial);

        let attempts = AtomicUsize::new(0);
        let value = context
            .protected("lookup", AuthScheme::Cookies, |_| async {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rejected())
                } else {
                    Ok(7)
                }
            })
            .await?;

        assert_eq!(value, 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(login.calls(), 1);
        assert_eq!(context.snapshot().await.state(), SessionState::Valid);
        Ok(())
    }

    #[tokio::test]
    async fn second_rejection_is_fatal() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let context =
            SessionContext::new(authenticator(&server, login.clone(), dir.path())?, Session::new());

        let attempts = AtomicUsize::new(0);
        let result: PortalResult<()> = context
            .protected("lookup", AuthScheme::Cookies, |_| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(rejected())
            })
            .await;

        assert!(matches!(result, Err(PortalError::Unauthorized { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(login.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let login = RecordingLogin::shared("sid", "fresh");
        let context =
            SessionContext::new(authenticator(&server, login.clone(), dir.path())?, Session::new());

        let attempts = AtomicUsize::new(0);
        let result: PortalResult<()> = context
            .protected("lookup", AuthScheme::Cookies, |_| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(PortalError::EmptyResponse { operation: "lookup" })
            })
            .await;

        assert!(matches!(result, Err(PortalError::EmptyResponse { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn bearer_calls_receive_a_fresh_token() -> Result<()> {
        let server = MockServer::start_async().await;
        let info = server.mock(|when, then| {
            when.method(GET).path("/meechum").query_param("info", "json");
            then.status(200)
                .json_body(serde_json::json!({ "access_token": "bearer-1" }));
        });
        let dir = TempDir::new()?;
        let context = SessionContext::new(
            authenticator(&server, RecordingLogin::shared("sid", "fresh"), dir.path())?,
            Session::new(),
        );

        for _ in 0..2 {
            let token = context
                .protected("lookup", AuthScheme::Bearer, |credentials| async move {
                    Ok(credentials.bearer()?.expose().to_string())
                })
                .await?;
            assert_eq!(token, "bearer-1");
        }
        assert_eq!(info.hits(), 2);
        Ok(())
    }
}
