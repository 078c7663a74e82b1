//! Hand-off of resolved batches to the `ascp` command-line client.
//!
//! # Design
//! - One process per batch; the pairs travel in a temporary pair-list file (source line,
//!   destination line) that is removed when the call returns, whatever the outcome.
//! - Destination parent directories are created under the download root up front; a
//!   destination that would resolve outside the root fails the batch before anything
//!   is created.
//! - The transport token is passed to the process but never logged.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use gaffer_config::TransferConfig;
use gaffer_core::{FilePair, TransferBatch, is_plain_relative};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{TransferError, TransferResult};
use crate::paths::AsperaPaths;

/// Outcome of a successful batch transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Transfer host of the batch.
    pub host: String,
    /// Number of file pairs handed to the client.
    pub files: usize,
}

/// Anything that can execute one transfer batch.
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Transfer every pair of `batch` into the download root.
    async fn transfer(&self, batch: &TransferBatch) -> TransferResult<TransferReport>;
}

/// [`TransferClient`] running the `ascp` binary.
#[derive(Debug, Clone)]
pub struct AsperaClient {
    paths: AsperaPaths,
    download_dir: PathBuf,
    overwrite: String,
}

impl AsperaClient {
    /// Client using explicit paths.
    #[must_use]
    pub fn new(paths: AsperaPaths, download_dir: impl Into<PathBuf>, overwrite: impl Into<String>) -> Self {
        Self {
            paths,
            download_dir: download_dir.into(),
            overwrite: overwrite.into(),
        }
    }

    /// Client configured from the transfer section.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::UnsupportedPlatform`] when default paths are needed on an
    /// unknown platform.
    pub fn from_config(config: &TransferConfig) -> TransferResult<Self> {
        Ok(Self::new(
            AsperaPaths::resolve(config)?,
            config.download_dir.clone(),
            config.overwrite.clone(),
        ))
    }

    fn prepare_destinations(&self, pairs: &[FilePair]) -> TransferResult<()> {
        let targets = pairs
            .iter()
            .map(|pair| contained_target(&self.download_dir, &pair.destination))
            .collect::<TransferResult<Vec<_>>>()?;
        for target in targets {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| TransferError::Io {
                    operation: "transfer.create_destination",
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    fn command(&self, batch: &TransferBatch, pair_list: &Path) -> Command {
        let mut command = Command::new(&self.paths.ascp);
        command
            .arg("-i")
            .arg(&self.paths.key)
            .arg("-W")
            .arg(batch.token.expose())
            .arg("--mode=recv")
            .arg(format!("--host={}", batch.host))
            .arg(format!("--user={}", batch.user))
            .arg(format!("--overwrite={}", self.overwrite))
            .arg(format!("--file-pair-list={}", pair_list.display()))
            .arg(&self.download_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

fn contained_target(root: &Path, destination: &str) -> TransferResult<PathBuf> {
    let target = root.join(destination);
    if is_plain_relative(destination) && target.starts_with(root) {
        Ok(target)
    } else {
        Err(TransferError::UnsafeDestination {
            destination: destination.to_string(),
        })
    }
}

/// Write `pairs` in the two-lines-per-pair list format.
///
/// # Errors
///
/// Returns [`TransferError::Io`] when the temporary file cannot be written.
pub fn write_pair_list(pairs: &[FilePair]) -> TransferResult<NamedTempFile> {
    let io_error = |path: PathBuf| {
        move |source| TransferError::Io {
            operation: "transfer.pair_list",
            path,
            source,
        }
    };
    let mut file = NamedTempFile::new().map_err(io_error(std::env::temp_dir()))?;
    let path = file.path().to_path_buf();
    for pair in pairs {
        writeln!(file, "{}\n{}", pair.source, pair.destination)
            .map_err(io_error(path.clone()))?;
    }
    file.flush().map_err(io_error(path))?;
    Ok(file)
}

#[async_trait]
impl TransferClient for AsperaClient {
    async fn transfer(&self, batch: &TransferBatch) -> TransferResult<TransferReport> {
        if batch.is_empty() {
            return Err(TransferError::NoFiles {
                host: batch.host.clone(),
            });
        }
        self.prepare_destinations(batch.pairs())?;
        let pair_list = write_pair_list(batch.pairs())?;
        debug!(
            host = %batch.host,
            pair_list = %pair_list.path().display(),
            files = batch.pairs().len(),
            "pair list written"
        );

        info!(
            host = %batch.host,
            user = %batch.user,
            batch_id = batch.batch_id.as_deref().unwrap_or_default(),
            files = batch.pairs().len(),
            "starting batch transfer"
        );
        let status = self
            .command(batch, pair_list.path())
            .status()
            .await
            .map_err(|source| TransferError::Spawn {
                program: self.paths.ascp.clone(),
                source,
            })?;
        drop(pair_list);

        if !status.success() {
            return Err(TransferError::NonZeroExit {
                host: batch.host.clone(),
                code: status.code(),
            });
        }
        info!(host = %batch.host, "batch transfer finished");
        Ok(TransferReport {
            host: batch.host.clone(),
            files: batch.pairs().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaffer_core::TransportToken;

    fn batch(pairs: &[(&str, &str)]) -> TransferResult<TransferBatch> {
        let mut batch = TransferBatch::new("ats.example", TransportToken::new("tok"), "filetransfer")
            .map_err(|_| TransferError::NoFiles {
                host: "ats.example".to_string(),
            })?;
        for (source, destination) in pairs {
            batch.push_pair(*source, destination);
        }
        Ok(batch)
    }

    #[test]
    fn pair_list_has_two_lines_per_pair() -> anyhow::Result<()> {
        let batch = batch(&[("/src/a.wav", "t/a.wav"), ("/src/b.pdf", "t/b.pdf")])?;
        let file = write_pair_list(batch.pairs())?;
        let written = std::fs::read_to_string(file.path())?;
        assert_eq!(written, "/src/a.wav\nt/a.wav\n/src/b.pdf\nt/b.pdf\n");
        Ok(())
    }

    #[test]
    fn destinations_outside_the_root_are_refused() -> anyhow::Result<()> {
        let root = tempfile::TempDir::new()?;
        let client = AsperaClient::new(
            AsperaPaths {
                ascp: PathBuf::from("/nonexistent/ascp"),
                key: PathBuf::from("/nonexistent/key"),
            },
            root.path().join("dl"),
            "diff",
        );
        let pairs = [
            FilePair {
                source: "/src/a.mov".to_string(),
                destination: "title/a.mov".to_string(),
            },
            FilePair {
                source: "/src/b.mov".to_string(),
                destination: "../outside/b.mov".to_string(),
            },
        ];

        let result = client.prepare_destinations(&pairs);

        assert!(matches!(
            result,
            Err(TransferError::UnsafeDestination { ref destination }) if destination == "../outside/b.mov"
        ));
        assert!(!root.path().join("outside").exists());
        assert!(!root.path().join("dl").join("title").exists());
        Ok(())
    }

    #[test]
    fn absolute_destinations_do_not_replace_the_root() {
        let root = Path::new("/srv/dl");
        assert!(matches!(
            contained_target(root, "/etc/cron.d/x"),
            Err(TransferError::UnsafeDestination { .. })
        ));
        assert_eq!(
            contained_target(root, "81635402/a.wav").ok(),
            Some(PathBuf::from("/srv/dl/81635402/a.wav"))
        );
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_before_spawning() -> anyhow::Result<()> {
        let client = AsperaClient::new(
            AsperaPaths {
                ascp: PathBuf::from("/nonexistent/ascp"),
                key: PathBuf::from("/nonexistent/key"),
            },
            std::env::temp_dir(),
            "diff",
        );
        let result = client.transfer(&batch(&[])?).await;
        assert!(matches!(result, Err(TransferError::NoFiles { .. })));
        Ok(())
    }
}
