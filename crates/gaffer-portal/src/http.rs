//! Shared HTTP client with browser-like defaults and status classification.

use std::time::Duration;

use gaffer_config::HttpConfig;
use gaffer_core::{AccessToken, Session};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL, COOKIE, HeaderMap, HeaderValue,
    ORIGIN, PRAGMA, REFERER,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::endpoints::{PortalEndpoints, host_of};
use crate::error::{PortalError, PortalResult};

const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";
const EVENT_STREAM: &str = "text/event-stream";
const NO_CACHE: &str = "no-cache";
const HEADER_REQUESTED_WITH: &str = "x-requested-with";

/// HTTP client used for every portal call. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    stream_timeout: Duration,
}

impl PortalClient {
    /// Build a client from the HTTP section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Http`] if the underlying client cannot be constructed.
    pub fn new(config: &HttpConfig) -> PortalResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|source| PortalError::Http {
                operation: "http.client",
                url: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            stream_timeout: Duration::from_secs(config.stream_timeout_secs),
        })
    }

    /// GET carrying the cookies that match the target host.
    pub(crate) fn get(&self, url: &Url, session: &Session) -> RequestBuilder {
        with_cookies(self.client.get(url.clone()), url, session)
    }

    /// JSON POST in the style of the portal's own XHR calls.
    pub(crate) fn post_xhr<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        endpoints: &PortalEndpoints,
        session: &Session,
        body: &B,
    ) -> RequestBuilder {
        let request = self
            .client
            .post(url.clone())
            .header(ORIGIN, endpoints.origin.as_str())
            .header(HEADER_REQUESTED_WITH, "XMLHttpRequest")
            .json(body);
        with_cookies(request, url, session)
    }

    /// Subscription POST answered with an event stream.
    pub(crate) fn subscribe<B: Serialize + ?Sized>(
        &self,
        endpoints: &PortalEndpoints,
        session: &Session,
        token: &AccessToken,
        body: &B,
    ) -> RequestBuilder {
        let url = &endpoints.gateway;
        let request = self
            .client
            .post(url.clone())
            .timeout(self.stream_timeout)
            .header(ACCEPT, EVENT_STREAM)
            .header(CACHE_CONTROL, NO_CACHE)
            .header(PRAGMA, NO_CACHE)
            .header(ORIGIN, endpoints.origin.as_str())
            .header(REFERER, endpoints.referer.as_str())
            .header(AUTHORIZATION, format!("Bearer {}", token.expose()))
            .json(body);
        with_cookies(request, url, session)
    }

    /// Send a request and classify the response status.
    pub(crate) async fn send(
        &self,
        operation: &'static str,
        url: &Url,
        request: RequestBuilder,
    ) -> PortalResult<Response> {
        let response = request.send().await.map_err(|source| PortalError::Http {
            operation,
            url: url.to_string(),
            source,
        })?;
        debug!(operation, url = %url, status = response.status().as_u16(), "portal responded");
        check_status(operation, url, response)
    }
}

fn with_cookies(request: RequestBuilder, url: &Url, session: &Session) -> RequestBuilder {
    match session.cookie_header(host_of(url)) {
        Some(header) => request.header(COOKIE, header),
        None => request,
    }
}

fn check_status(operation: &'static str, url: &Url, response: Response) -> PortalResult<Response> {
    let status = response.status();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(PortalError::Unauthorized {
            operation,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(PortalError::Status {
            operation,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}
