//! Collaborators and wiring shared by this crate's unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gaffer_config::GafferConfig;
use gaffer_core::StoredCookie;
use httpmock::MockServer;

use crate::auth::SessionAuthenticator;
use crate::credentials::FileCredentialStore;
use crate::endpoints::PortalEndpoints;
use crate::error::PortalResult;
use crate::http::PortalClient;
use crate::login::{InteractiveLogin, LoginRequest};

/// Login collaborator that hands out a fixed cookie and counts invocations.
pub(crate) struct RecordingLogin {
    calls: AtomicUsize,
    cookie: StoredCookie,
}

impl RecordingLogin {
    pub(crate) fn shared(name: &str, value: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            cookie: StoredCookie::new(name, value),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractiveLogin for RecordingLogin {
    async fn login(&self, _request: &LoginRequest) -> PortalResult<Vec<StoredCookie>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.cookie.clone()])
    }
}

/// Login collaborator that never finishes in a test's lifetime.
pub(crate) struct SlowLogin;

#[async_trait]
impl InteractiveLogin for SlowLogin {
    async fn login(&self, _request: &LoginRequest) -> PortalResult<Vec<StoredCookie>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

/// Configuration pointing every endpoint at the mock server.
pub(crate) fn base_config(server: &MockServer) -> GafferConfig {
    let mut config = GafferConfig::default();
    config.portal.base_url = server.base_url();
    config.portal.gateway_url = server.url("/subscriptions/sse");
    config.oauth.authorize_url = server.url("/as/authorization.oauth2");
    config
}

pub(crate) fn authenticator(
    server: &MockServer,
    login: Arc<dyn InteractiveLogin>,
    profile_dir: &std::path::Path,
) -> PortalResult<SessionAuthenticator> {
    let mut config = base_config(server);
    config.storage.profile_dir = profile_dir.to_path_buf();
    let timeout = Duration::from_secs(config.login.timeout_secs);
    authenticator_with(&config, login, timeout)
}

pub(crate) fn authenticator_with(
    config: &GafferConfig,
    login: Arc<dyn InteractiveLogin>,
    login_timeout: Duration,
) -> PortalResult<SessionAuthenticator> {
    let http = PortalClient::new(&config.http)?;
    let endpoints = PortalEndpoints::from_config(&config.portal, &config.oauth)?;
    let store = Arc::new(FileCredentialStore::new(config.storage.session_file()));
    Ok(SessionAuthenticator::new(
        http,
        endpoints,
        &config.oauth,
        login,
        store,
        login_timeout,
    ))
}
