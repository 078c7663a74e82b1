use std::fmt::{self, Debug, Formatter};
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, CoreResult};

/// Transport token issued with a manifest batch.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportToken(String);

impl TransportToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value handed to the transfer client.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for TransportToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("TransportToken(<redacted>)")
    }
}

/// One file to fetch: transfer source identifier and relative destination path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    /// Source identifier on the transfer host.
    pub source: String,
    /// Destination relative to the download root.
    pub destination: String,
}

/// Files sharing one transport session.
///
/// Destinations are unique relative paths within a batch; [`TransferBatch::push_pair`]
/// refuses a destination that is already present or that could leave the download root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferBatch {
    /// Transfer host.
    pub host: String,
    /// Transport token for this batch.
    pub token: TransportToken,
    /// Transfer user.
    pub user: String,
    /// Server-side batch identifier when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pairs: Vec<FilePair>,
}

impl TransferBatch {
    /// Default transfer user when the manifest does not name one.
    pub const DEFAULT_USER: &'static str = "filetransfer";

    /// Start an empty batch.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBatch`] when the host, token or user is empty.
    pub fn new(
        host: impl Into<String>,
        token: TransportToken,
        user: impl Into<String>,
    ) -> CoreResult<Self> {
        let host = host.into();
        let user = user.into();
        if host.trim().is_empty() {
            return Err(CoreError::InvalidBatch {
                field: "host",
                reason: "must not be empty",
            });
        }
        if token.expose().trim().is_empty() {
            return Err(CoreError::InvalidBatch {
                field: "token",
                reason: "must not be empty",
            });
        }
        if user.trim().is_empty() {
            return Err(CoreError::InvalidBatch {
                field: "user",
                reason: "must not be empty",
            });
        }
        Ok(Self {
            host,
            token,
            user,
            batch_id: None,
            pairs: Vec::new(),
        })
    }

    /// Attach the server-side batch identifier.
    #[must_use]
    pub fn with_batch_id(mut self, batch_id: Option<String>) -> Self {
        self.batch_id = batch_id;
        self
    }

    /// Append a pair. The destination is trimmed of surrounding `/`.
    ///
    /// Returns `false` (and keeps the earlier pair) when the destination collides with
    /// one already in the batch, is empty after trimming, or is not a plain relative path.
    pub fn push_pair(&mut self, source: impl Into<String>, destination: &str) -> bool {
        let destination = destination.trim_matches('/');
        if destination.is_empty() {
            warn!(host = %self.host, "dropping file pair with empty destination");
            return false;
        }
        if !is_plain_relative(destination) {
            warn!(host = %self.host, destination, "dropping file pair escaping the download root");
            return false;
        }
        if self.pairs.iter().any(|pair| pair.destination == destination) {
            warn!(host = %self.host, destination, "dropping file pair with duplicate destination");
            return false;
        }
        self.pairs.push(FilePair {
            source: source.into(),
            destination: destination.to_string(),
        });
        true
    }

    /// Ordered file pairs.
    #[must_use]
    pub fn pairs(&self) -> &[FilePair] {
        &self.pairs
    }

    /// Whether the batch has nothing to transfer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Whether `path` only walks down: no `..`, no root, no drive or UNC prefix.
#[must_use]
pub fn is_plain_relative(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
