//! Facade wiring the portal clients to one shared session context.

use std::sync::Arc;
use std::time::Duration;

use gaffer_config::GafferConfig;
use gaffer_core::{MaterialRequest, ScalarId, Session, SourceRequest};

use crate::auth::SessionAuthenticator;
use crate::catalog::{CatalogClient, MaterialSearch};
use crate::credentials::{CredentialStore, FileCredentialStore};
use crate::endpoints::PortalEndpoints;
use crate::error::PortalResult;
use crate::http::PortalClient;
use crate::login::InteractiveLogin;
use crate::manifest::{Manifest, ManifestResolver};
use crate::reauth::{AuthScheme, SessionContext};

/// Every protected portal operation, each wrapped in the one-retry policy.
pub struct Portal {
    context: SessionContext,
    catalog: CatalogClient,
    manifests: ManifestResolver,
}

impl Portal {
    /// Build the portal from configuration, persisting the session under the profile
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured URL is invalid or the HTTP client cannot be
    /// built.
    pub fn from_config(
        config: &GafferConfig,
        login: Arc<dyn InteractiveLogin>,
    ) -> PortalResult<Self> {
        let store = Arc::new(FileCredentialStore::new(config.storage.session_file()));
        Self::with_store(config, login, store)
    }

    /// Build the portal with an explicit credential store.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured URL is invalid or the HTTP client cannot be
    /// built.
    pub fn with_store(
        config: &GafferConfig,
        login: Arc<dyn InteractiveLogin>,
        store: Arc<dyn CredentialStore>,
    ) -> PortalResult<Self> {
        let http = PortalClient::new(&config.http)?;
        let endpoints = PortalEndpoints::from_config(&config.portal, &config.oauth)?;
        let auth = SessionAuthenticator::new(
            http.clone(),
            endpoints.clone(),
            &config.oauth,
            login,
            store,
            Duration::from_secs(config.login.timeout_secs),
        );

        Ok(Self {
            context: SessionContext::restore(auth),
            catalog: CatalogClient::new(
                http.clone(),
                endpoints.clone(),
                config.portal.source_type.clone(),
                config.portal.request_limit,
            ),
            manifests: ManifestResolver::new(http, endpoints, config.transfer.user.clone()),
        })
    }

    /// Copy of the shared session.
    pub async fn session(&self) -> Session {
        self.context.snapshot().await
    }

    /// Source requests filed for `title_id`.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::search_requests`]; authorization failures are retried once.
    pub async fn search_requests(&self, title_id: &str) -> PortalResult<Vec<SourceRequest>> {
        let catalog = &self.catalog;
        self.context
            .protected("search_requests", AuthScheme::Cookies, move |credentials| async move {
                catalog.search_requests(&credentials, title_id).await
            })
            .await
    }

    /// Materials delivered against `request_ids`.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::search_assets`]; authorization failures are retried once.
    pub async fn search_assets(&self, request_ids: &[ScalarId]) -> PortalResult<MaterialSearch> {
        let catalog = &self.catalog;
        self.context
            .protected("search_assets", AuthScheme::Bearer, move |credentials| async move {
                catalog.search_assets(&credentials, request_ids).await
            })
            .await
    }

    /// Transfer manifest for `requests`.
    ///
    /// # Errors
    ///
    /// See [`ManifestResolver::resolve`]; authorization failures are retried once.
    pub async fn resolve(&self, requests: &[MaterialRequest]) -> PortalResult<Manifest> {
        let manifests = &self.manifests;
        self.context
            .protected("resolve_manifest", AuthScheme::Bearer, move |credentials| async move {
                manifests.resolve(&credentials, requests).await
            })
            .await
    }
}
