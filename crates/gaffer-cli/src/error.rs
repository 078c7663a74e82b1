//! # Design
//!
//! - A pipeline error always names the title and the stage it stopped in.
//! - The underlying crate error is kept as the source for `{:#}` rendering.

use std::error::Error as StdError;

use thiserror::Error;

use crate::pipeline::Stage;

/// Boxed source error carried by [`PipelineError`].
pub type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure of one title's run.
#[derive(Debug, Error)]
#[error("title run failed")]
pub struct PipelineError {
    /// Title that failed.
    pub title_id: String,
    /// Stage the run stopped in.
    pub stage: Stage,
    /// Underlying failure.
    #[source]
    pub source: BoxedError,
}

impl PipelineError {
    /// Wrap `source` as the failure of `title_id` at `stage`.
    pub fn new(title_id: &str, stage: Stage, source: impl Into<BoxedError>) -> Self {
        Self {
            title_id: title_id.to_string(),
            stage,
            source: source.into(),
        }
    }

    /// Message of the innermost cause chain, joined with `: `.
    #[must_use]
    pub fn detail(&self) -> String {
        let mut parts = Vec::new();
        let mut current: Option<&(dyn StdError + 'static)> = Some(self.source.as_ref());
        while let Some(err) = current {
            parts.push(err.to_string());
            current = err.source();
        }
        parts.join(": ")
    }
}

/// Result alias for pipeline stages.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gaffer_portal::PortalError;

    #[test]
    fn detail_walks_the_source_chain() {
        let err = PipelineError::new(
            "81635402",
            Stage::ResolveManifest,
            PortalError::Manifest { field: "session" },
        );
        assert_eq!(err.to_string(), "title run failed");
        assert_eq!(
            err.detail(),
            "manifest response is missing a required field"
        );
        assert_eq!(err.stage.as_str(), "resolve_manifest");
    }
}
