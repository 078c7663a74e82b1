//! # Design
//!
//! - Constant messages; the operation, URL and status travel as fields.
//! - `is_authorization_failure` is the single predicate the retry policy consults.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for portal operations.
pub type PortalResult<T> = Result<T, PortalError>;

/// Errors raised while talking to the portal or driving login.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The request could not be sent or its body could not be read.
    #[error("portal request failed")]
    Http {
        /// Operation that issued the request.
        operation: &'static str,
        /// Target URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// A protected call answered 401 or 403.
    #[error("portal rejected the session")]
    Unauthorized {
        /// Operation that issued the request.
        operation: &'static str,
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The portal answered with another non-success status.
    #[error("portal returned an unexpected status")]
    Status {
        /// Operation that issued the request.
        operation: &'static str,
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The info endpoint did not hand out an access token.
    #[error("access token not found in response")]
    AccessToken {
        /// Info endpoint URL.
        url: String,
    },
    /// A subscription stream closed without a data-bearing frame.
    #[error("stream closed without a data frame")]
    EmptyResponse {
        /// Operation that opened the stream.
        operation: &'static str,
    },
    /// The manifest payload lacked a required member.
    #[error("manifest response is missing a required field")]
    Manifest {
        /// Member that was absent.
        field: &'static str,
    },
    /// A payload could not be encoded or decoded.
    #[error("portal payload is malformed")]
    Json {
        /// Operation handling the payload.
        operation: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A configured or derived URL could not be parsed.
    #[error("invalid portal url")]
    InvalidUrl {
        /// Offending value.
        value: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The interactive login collaborator failed.
    #[error("interactive login failed")]
    Login {
        /// Collaborator step that failed.
        operation: &'static str,
        /// Human-readable detail.
        detail: String,
    },
    /// The interactive login did not finish in time.
    #[error("interactive login timed out")]
    LoginTimeout {
        /// Configured bound.
        timeout_secs: u64,
    },
    /// Local IO failed.
    #[error("portal io failure")]
    Io {
        /// Operation that touched the filesystem or a child process.
        operation: &'static str,
        /// Path involved, when there is one.
        path: Option<PathBuf>,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl PortalError {
    /// Whether the failure means the session is no longer accepted.
    #[must_use]
    pub const fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::AccessToken { .. })
    }
}
