use std::fmt::{self, Debug, Formatter};

use serde::{Deserialize, Serialize};

/// Authentication state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No login has succeeded yet in this process.
    Unauthenticated,
    /// Cookies were accepted by the portal.
    Valid,
    /// A protected call was rejected after the session had been valid.
    Expired,
}

/// Inputs that drive [`SessionState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Interactive login (or a successful check of restored cookies) completed.
    LoginSucceeded,
    /// A protected call answered with 401/403 or the token exchange was refused.
    AuthorizationRejected,
}

impl SessionState {
    /// Apply an event and return the resulting state.
    #[must_use]
    pub const fn next(self, event: SessionEvent) -> Self {
        match (self, event) {
            (_, SessionEvent::LoginSucceeded) => Self::Valid,
            (Self::Valid | Self::Expired, SessionEvent::AuthorizationRejected) => Self::Expired,
            (Self::Unauthenticated, SessionEvent::AuthorizationRejected) => Self::Unauthenticated,
        }
    }

    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Valid => "valid",
            Self::Expired => "expired",
        }
    }
}

/// One cookie captured from the browser login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain attribute; `None` matches every host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path attribute, kept for round-tripping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StoredCookie {
    /// Construct a host-agnostic cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    /// Scope the cookie to a domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Whether this cookie should be sent to `host`.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        let Some(domain) = self.domain.as_deref() else {
            return true;
        };
        let domain = domain.trim_start_matches('.');
        if domain.is_empty() {
            return true;
        }
        let host = host.to_ascii_lowercase();
        let domain = domain.to_ascii_lowercase();
        host == domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// Short-lived bearer token returned by the portal info endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value for the `authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for AccessToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("AccessToken(<redacted>)")
    }
}

/// Cookie bag plus optional bearer token, owned by one pipeline run at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<StoredCookie>,
    token: Option<AccessToken>,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Empty, unauthenticated session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cookies: Vec::new(),
            token: None,
            state: SessionState::Unauthenticated,
        }
    }

    /// Session restored from persisted cookies; still unauthenticated until checked.
    #[must_use]
    pub const fn from_cookies(cookies: Vec<StoredCookie>) -> Self {
        Self {
            cookies,
            token: None,
            state: SessionState::Unauthenticated,
        }
    }

    /// Current authentication state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is currently [`SessionState::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.state, SessionState::Valid)
    }

    /// Captured cookies.
    #[must_use]
    pub fn cookies(&self) -> &[StoredCookie] {
        &self.cookies
    }

    /// Whether any cookie is present.
    #[must_use]
    pub fn has_cookies(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// Merge a freshly captured jar; a cookie replaces an existing one with the same
    /// name and domain.
    pub fn absorb_cookies(&mut self, cookies: Vec<StoredCookie>) {
        for cookie in cookies {
            if let Some(existing) = self
                .cookies
                .iter_mut()
                .find(|held| held.name == cookie.name && held.domain == cookie.domain)
            {
                *existing = cookie;
            } else {
                self.cookies.push(cookie);
            }
        }
    }

    /// Apply a state transition. Rejection also discards the bearer token.
    pub fn apply(&mut self, event: SessionEvent) {
        self.state = self.state.next(event);
        if event == SessionEvent::AuthorizationRejected {
            self.token = None;
        }
    }

    /// Current bearer token, if one was derived.
    #[must_use]
    pub const fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Record a freshly derived bearer token.
    pub fn set_token(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    /// `Cookie` header value for a request to `host`, or `None` if nothing matches.
    #[must_use]
    pub fn cookie_header(&self, host: &str) -> Option<String> {
        let header = self
            .cookies
            .iter()
            .filter(|cookie| cookie.matches_host(host))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        (!header.is_empty()).then_some(header)
    }
}
