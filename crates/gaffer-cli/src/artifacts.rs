//! Per-title JSON dumps of every intermediate pipeline value.
//!
//! # Design
//! - Files land in `<root>/<title_id>/<artifact>.json`, pretty-printed.
//! - Writing an artifact never fails a title; errors are logged and swallowed.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

/// Intermediate values written for each title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Material search payload as received.
    RawAssets,
    /// Flattened material records.
    ProcessedAssets,
    /// Active, deduplicated materials.
    FilteredAssets,
    /// Category buckets.
    CategorizedAssets,
    /// Materials chosen for transfer.
    SelectedAssets,
    /// Sanitized manifest requests.
    TransferRequests,
    /// Manifest payload as received.
    Manifests,
}

impl Artifact {
    /// File name inside the title directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::RawAssets => "raw_assets.json",
            Self::ProcessedAssets => "processed_assets.json",
            Self::FilteredAssets => "filtered_assets.json",
            Self::CategorizedAssets => "categorized_assets.json",
            Self::SelectedAssets => "selected_assets.json",
            Self::TransferRequests => "transfer_requests.json",
            Self::Manifests => "manifests.json",
        }
    }
}

/// Writes artifacts under a root directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    /// Writer rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path an artifact of `title_id` is written to.
    #[must_use]
    pub fn path_for(&self, title_id: &str, artifact: Artifact) -> PathBuf {
        self.root.join(title_id).join(artifact.file_name())
    }

    /// Write `value`; failures are logged at WARN.
    pub fn write<T: Serialize + ?Sized>(&self, title_id: &str, artifact: Artifact, value: &T) {
        let path = self.path_for(title_id, artifact);
        match write_json(&path, value) {
            Ok(()) => debug!(path = %path.display(), "artifact written"),
            Err(err) => warn!(path = %path.display(), error = %err, "failed to write artifact"),
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn artifacts_land_in_the_title_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let writer = ArtifactWriter::new(dir.path());
        writer.write("81635402", Artifact::Manifests, &json!({ "batches": 1 }));

        let path = dir.path().join("81635402").join("manifests.json");
        let stored: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        assert_eq!(stored, json!({ "batches": 1 }));
        Ok(())
    }

    #[test]
    fn write_failures_are_swallowed() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x")?;
        let writer = ArtifactWriter::new(&blocker);
        writer.write("81635402", Artifact::RawAssets, &json!([]));
        assert!(!writer.path_for("81635402", Artifact::RawAssets).exists());
        Ok(())
    }
}
