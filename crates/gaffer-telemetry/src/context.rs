//! Span helpers for the process and for each per-title pipeline run.
//!
//! # Design
//! - The process span carries the command and build SHA for every line logged.
//! - Each title runs inside its own span; the current stage is recorded on it as the
//!   run advances so failures carry both the title id and the stage.

use tracing::{Span, field, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the process-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the process-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "gaffer",
            command = %command,
            build_sha = %build_sha()
        )));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Span every per-title run executes in. `stage` starts empty.
#[must_use]
pub fn pipeline_span(title_id: &str) -> Span {
    tracing::info_span!("pipeline", title_id = %title_id, stage = field::Empty)
}

/// Record the current stage on the active pipeline span.
pub fn record_stage(stage: &str) {
    Span::current().record("stage", field::display(stage));
}
