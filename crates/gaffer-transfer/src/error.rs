//! # Design
//!
//! - Constant messages; host, program and path travel as fields.
//! - A failed transfer is reported, never retried.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors raised while handing a batch to the transfer client.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The transfer client exited unsuccessfully.
    #[error("transfer client exited unsuccessfully")]
    NonZeroExit {
        /// Transfer host of the batch.
        host: String,
        /// Exit code, absent when the process was killed by a signal.
        code: Option<i32>,
    },
    /// The transfer client could not be started.
    #[error("failed to start transfer client")]
    Spawn {
        /// Program that was spawned.
        program: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The batch carried no files.
    #[error("batch has no files to download")]
    NoFiles {
        /// Transfer host of the batch.
        host: String,
    },
    /// A destination would resolve outside the download root.
    #[error("destination escapes the download root")]
    UnsafeDestination {
        /// Offending destination as received.
        destination: String,
    },
    /// No default client location is known for this platform.
    #[error("unsupported platform for the transfer client")]
    UnsupportedPlatform {
        /// Operating system name.
        os: &'static str,
    },
    /// Local filesystem work around the transfer failed.
    #[error("transfer io failure")]
    Io {
        /// Step that touched the filesystem.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
