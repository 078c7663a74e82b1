#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Logging primitives shared across the gaffer workspace.
//!
//! Layout: `init.rs` (subscriber installation and log files), `context.rs` (process and
//! per-title spans), `error.rs` (`TelemetryError`).

pub mod context;
pub mod error;
pub mod init;

pub use context::{GlobalContextGuard, pipeline_span, record_stage};
pub use error::{TelemetryError, TelemetryResult};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LogGuards, LoggingConfig, build_sha, init_logging};
