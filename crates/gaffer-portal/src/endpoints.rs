//! Parsed portal URLs derived from configuration.

use gaffer_config::{OAuthConfig, PortalConfig};
use url::Url;

use crate::error::{PortalError, PortalResult};

/// Every URL the portal client talks to, parsed once up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalEndpoints {
    /// Request-search endpoint.
    pub request_search: Url,
    /// Subscription endpoint shared by material search and manifest setup.
    pub gateway: Url,
    /// OAuth redirect target whose cookies make up the session.
    pub redirect_target: Url,
    /// Token exchange endpoint.
    pub info: Url,
    /// OAuth authorize endpoint.
    pub authorize: Url,
    /// `origin` header value.
    pub origin: String,
    /// `referer` header value.
    pub referer: String,
}

impl PortalEndpoints {
    /// Derive the endpoint set from the portal and OAuth sections.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] when a configured URL does not parse.
    pub fn from_config(portal: &PortalConfig, oauth: &OAuthConfig) -> PortalResult<Self> {
        let origin = portal.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            request_search: parse(&portal.request_search_url())?,
            gateway: parse(&portal.gateway_url)?,
            redirect_target: parse(&portal.redirect_url())?,
            info: parse(&portal.info_url())?,
            authorize: parse(&oauth.authorize_url)?,
            referer: format!("{origin}/"),
            origin,
        })
    }
}

pub(crate) fn parse(value: &str) -> PortalResult<Url> {
    Url::parse(value).map_err(|source| PortalError::InvalidUrl {
        value: value.to_string(),
        source,
    })
}

/// Host the cookie jar is filtered against; empty when the URL has none.
pub(crate) fn host_of(url: &Url) -> &str {
    url.host_str().unwrap_or_default()
}
