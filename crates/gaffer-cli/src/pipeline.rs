//! Per-title run: search, selection, manifest resolution and transfer dispatch.
//!
//! # Design
//! - Each title runs inside its own span; the stage is recorded as the run advances.
//! - A failure ends that title only; the caller moves on to the next one.
//! - Batches are dispatched one after another. A failed batch does not stop the
//!   remaining ones, but the title is reported as failed at the transfer stage.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use gaffer_core::{
    ScalarId, categorize, dedupe_by_filename, filter_active, sanitize_for_transfer, select_best,
};
use gaffer_portal::Portal;
use gaffer_telemetry::{pipeline_span, record_stage};
use gaffer_transfer::{TransferClient, TransferError};
use tracing::{Instrument, debug, error, info, warn};

use crate::artifacts::{Artifact, ArtifactWriter};
use crate::error::{BoxedError, PipelineError, PipelineResult};
use crate::notify::{Notifier, TitleEvent, timestamp_now_ms};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request search for the title.
    SearchRequests,
    /// Material search for the found requests.
    SearchAssets,
    /// Filtering, deduplication, categorization and selection.
    Select,
    /// Manifest setup for the selected materials.
    ResolveManifest,
    /// Transfer client dispatch.
    Transfer,
}

impl Stage {
    /// Stable label used in logs, events and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchRequests => "search_requests",
            Self::SearchAssets => "search_assets",
            Self::Select => "select",
            Self::ResolveManifest => "resolve_manifest",
            Self::Transfer => "transfer",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Counters describing a completed title run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleSummary {
    /// Source requests found.
    pub requests: usize,
    /// Materials returned by the catalog.
    pub materials: usize,
    /// Materials selected for transfer.
    pub selected: usize,
    /// Batches in the manifest.
    pub batches: usize,
    /// Batches the transfer client completed.
    pub transferred: usize,
}

/// Everything a title run needs, built once per process.
pub struct Pipeline {
    portal: Portal,
    transfer: Option<Arc<dyn TransferClient>>,
    artifacts: ArtifactWriter,
    notifier: Option<Notifier>,
}

impl Pipeline {
    /// Wire the pipeline. Without a transfer client, runs stop after manifest resolution.
    #[must_use]
    pub fn new(
        portal: Portal,
        transfer: Option<Arc<dyn TransferClient>>,
        artifacts: ArtifactWriter,
        notifier: Option<Notifier>,
    ) -> Self {
        Self {
            portal,
            transfer,
            artifacts,
            notifier,
        }
    }

    /// Run one title and report its outcome to the notification hook.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] of the stage that failed.
    pub async fn run_title(&self, title_id: &str) -> PipelineResult<TitleSummary> {
        async {
            let result = self.run_stages(title_id).await;
            match &result {
                Ok(summary) => {
                    info!(
                        requests = summary.requests,
                        materials = summary.materials,
                        selected = summary.selected,
                        batches = summary.batches,
                        transferred = summary.transferred,
                        "title completed"
                    );
                    self.notify(title_id, None, "success", None).await;
                }
                Err(err) => {
                    let detail = err.detail();
                    error!(stage = err.stage.as_str(), error = %detail, "title failed");
                    self.notify(title_id, Some(err.stage), "error", Some(&detail))
                        .await;
                }
            }
            result
        }
        .instrument(pipeline_span(title_id))
        .await
    }

    async fn run_stages(&self, title_id: &str) -> PipelineResult<TitleSummary> {
        let mut summary = TitleSummary::default();

        record_stage(Stage::SearchRequests.as_str());
        let requests = self
            .portal
            .search_requests(title_id)
            .await
            .map_err(fail(title_id, Stage::SearchRequests))?;
        summary.requests = requests.len();
        if requests.is_empty() {
            info!("no source requests for title");
            return Ok(summary);
        }
        let request_ids: Vec<ScalarId> = requests
            .into_iter()
            .map(|request| request.request_id)
            .collect();

        record_stage(Stage::SearchAssets.as_str());
        let search = self
            .portal
            .search_assets(&request_ids)
            .await
            .map_err(fail(title_id, Stage::SearchAssets))?;
        self.artifacts
            .write(title_id, Artifact::RawAssets, &search.raw);
        self.artifacts
            .write(title_id, Artifact::ProcessedAssets, &search.materials);
        summary.materials = search.materials.len();

        record_stage(Stage::Select.as_str());
        let filtered = dedupe_by_filename(filter_active(search.materials));
        self.artifacts
            .write(title_id, Artifact::FilteredAssets, &filtered);
        let active = filtered.len();
        let categorized = categorize(filtered);
        self.artifacts
            .write(title_id, Artifact::CategorizedAssets, &categorized);
        if categorized.is_empty() {
            info!(active, "no material matched a known category");
        }
        let selected = select_best(&categorized);
        debug!(
            active,
            categorized = categorized.len(),
            selected = selected.len(),
            "selection finished"
        );
        self.artifacts
            .write(title_id, Artifact::SelectedAssets, &selected);
        summary.selected = selected.len();
        if selected.is_empty() {
            info!("nothing selected for transfer");
            return Ok(summary);
        }
        let transfer_requests = sanitize_for_transfer(&selected);
        self.artifacts
            .write(title_id, Artifact::TransferRequests, &transfer_requests);

        record_stage(Stage::ResolveManifest.as_str());
        let manifest = self
            .portal
            .resolve(&transfer_requests)
            .await
            .map_err(fail(title_id, Stage::ResolveManifest))?;
        self.artifacts
            .write(title_id, Artifact::Manifests, &manifest.raw);
        summary.batches = manifest.batches.len();

        let Some(client) = &self.transfer else {
            info!(batches = summary.batches, "transfer disabled; stopping after manifest");
            return Ok(summary);
        };

        record_stage(Stage::Transfer.as_str());
        let mut first_failure = None;
        for batch in &manifest.batches {
            match client.transfer(batch).await {
                Ok(report) => {
                    summary.transferred += 1;
                    info!(host = %report.host, files = report.files, "batch transferred");
                }
                Err(TransferError::NoFiles { host }) => {
                    warn!(%host, "no files to download");
                }
                Err(err) => {
                    error!(host = %batch.host, error = %err, "batch transfer failed");
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
        }
        match first_failure {
            Some(err) => Err(PipelineError::new(title_id, Stage::Transfer, err)),
            None => Ok(summary),
        }
    }

    async fn notify(
        &self,
        title_id: &str,
        stage: Option<Stage>,
        outcome: &str,
        message: Option<&str>,
    ) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        notifier
            .emit(&TitleEvent {
                title_id,
                stage: stage.map(Stage::as_str),
                outcome,
                message,
                timestamp_ms: timestamp_now_ms(),
            })
            .await;
    }
}

fn fail<E: Into<BoxedError>>(title_id: &str, stage: Stage) -> impl FnOnce(E) -> PipelineError + '_ {
    move |err| PipelineError::new(title_id, stage, err)
}
