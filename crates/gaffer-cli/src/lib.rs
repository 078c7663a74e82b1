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

//! Command-line driver fetching studio deliverables for one or more titles.
//!
//! Layout:
//! - `cli.rs`: argument parsing, process setup and the per-title loop
//! - `pipeline.rs`: one title's run from request search to transfer dispatch
//! - `artifacts.rs`: per-title JSON dumps
//! - `notify.rs`: optional outcome webhook
//! - `error.rs`: `PipelineError`
//! - `main.rs`: thin entrypoint delegating to `run()`

pub mod artifacts;
pub mod cli;
pub mod error;
pub mod notify;
pub mod pipeline;

pub use artifacts::{Artifact, ArtifactWriter};
pub use cli::{Cli, build_pipeline, run, run_with};
pub use error::{PipelineError, PipelineResult};
pub use notify::{Notifier, TitleEvent};
pub use pipeline::{Pipeline, Stage, TitleSummary};
