//! Execution engine module
//!
//! Sequences scan → transform → stage → upload for one entity.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ExportEngine` - Drives one run through its states
//! - `RunState` - `INIT → SCANNING → UPLOADING → DONE`, or `FAILED`
//! - `RunSummary` - Counts, dropped records and upload outcomes of a run
//!
//! Record-level errors and upload errors are isolated and reported in the
//! summary. A scan failure aborts the run.

mod types;

pub use types::{RunState, RunSummary, UploadOutcome};

use crate::config::RunConfig;
use crate::error::Result;
use crate::loader::{EntityDefinition, VariantDefinition};
use crate::output::{StagingSink, Uploader};
use crate::scan::{Scanner, TableSource};
use crate::transform::{RecordFailure, RecordTransformer, RoutedRow, UNKNOWN_RECORD_ID};
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

/// Export engine for one entity and stage
pub struct ExportEngine<'a, S: TableSource> {
    /// Run configuration
    config: &'a RunConfig,
    /// Entity being exported
    entity: &'a EntityDefinition,
    /// Page scanner over the source table
    scanner: Scanner<S>,
    /// Staging files
    sink: StagingSink,
    /// Blob storage uploader
    uploader: Uploader,
    /// Report
    summary: RunSummary,
}

impl<'a, S: TableSource> ExportEngine<'a, S> {
    /// Create an engine in the `INIT` state
    pub fn new(
        config: &'a RunConfig,
        entity: &'a EntityDefinition,
        source: S,
        uploader: Uploader,
    ) -> Result<Self> {
        let sink = StagingSink::new(config.staging_dir(), config.staging_mode())?;
        let summary = RunSummary::new(
            config.run_id(&entity.name),
            config.stage().as_str(),
            &entity.name,
            &entity.variant_names(),
        );

        Ok(Self {
            config,
            entity,
            scanner: Scanner::new(source),
            sink,
            uploader,
            summary,
        })
    }

    /// Create an engine uploading to the configured destination
    pub fn from_config(
        config: &'a RunConfig,
        entity: &'a EntityDefinition,
        source: S,
    ) -> Result<Self> {
        let uploader = Uploader::from_url(&config.destination_url())?;
        Self::new(config, entity, source, uploader)
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.summary.state
    }

    /// Report so far
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Staging sink
    pub fn sink(&self) -> &StagingSink {
        &self.sink
    }

    /// Run to completion
    ///
    /// Returns the summary once `DONE`. A fatal error leaves the engine in
    /// `FAILED` and is returned as is.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let span = info_span!("export", run_id = %self.summary.run_id);
        self.run_phases().instrument(span).await
    }

    async fn run_phases(&mut self) -> Result<RunSummary> {
        let start = Instant::now();
        info!(
            entity = %self.entity.name,
            stage = %self.config.stage(),
            table = self.scanner.table_name(),
            "Starting export"
        );

        let result = async {
            self.scan_phase().await?;
            self.upload_phase().await
        }
        .await;

        self.summary.duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    pages = self.summary.pages,
                    records = self.summary.records_scanned,
                    rows = self.summary.rows_written(),
                    skipped = self.summary.failures.len(),
                    failed_uploads = self.summary.failed_uploads().count(),
                    duration_ms = self.summary.duration_ms,
                    "Export completed"
                );
                Ok(self.summary.clone())
            }
            Err(e) => {
                self.transition(RunState::Failed);
                error!("Export failed: {e}");
                Err(e)
            }
        }
    }

    /// Scan every page, transforming and staging its records
    ///
    /// Stale staging files are dealt with before the first page is requested.
    pub async fn scan_phase(&mut self) -> Result<()> {
        self.transition(RunState::Scanning);
        let entity = self.entity;

        for variant in &entity.variants {
            self.sink.prepare(variant)?;
        }

        let transformer = RecordTransformer::new(entity);
        loop {
            let page = match self.scanner.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) => {
                    self.record_scan_progress();
                    return Err(e);
                }
            };

            let outcome = transformer.transform_page(&page.records);
            self.summary.failures.extend(outcome.failures);

            for routed in outcome.rows {
                self.stage_row(routed)?;
            }
            self.record_scan_progress();
        }

        Ok(())
    }

    /// Finalize every variant's staging file and upload it
    ///
    /// Each upload is attempted regardless of the others. The run reaches
    /// `DONE` even when some of them fail.
    pub async fn upload_phase(&mut self) -> Result<()> {
        self.transition(RunState::Uploading);
        let entity = self.entity;

        let mut ready: Vec<&VariantDefinition> = Vec::with_capacity(entity.variants.len());
        for variant in &entity.variants {
            match self.sink.finalize(variant) {
                Ok(_) => ready.push(variant),
                Err(e) => {
                    error!(variant = %variant.name, "Failed to finalize staging file: {e}");
                    let key = self
                        .config
                        .object_key(&variant.table, &variant.entity)
                        .unwrap_or_default();
                    self.summary
                        .uploads
                        .push(UploadOutcome::failed(&variant.name, key, e.to_string()));
                }
            }
        }

        for variant in ready {
            let outcome = match self.upload_variant(variant).await {
                Ok(outcome) => outcome,
                Err(e) => UploadOutcome::failed(&variant.name, String::new(), e.to_string()),
            };
            if let Some(message) = &outcome.error {
                error!(variant = %variant.name, key = %outcome.key, "Upload failed: {message}");
            }
            self.summary.uploads.push(outcome);
        }

        self.transition(RunState::Done);
        Ok(())
    }

    async fn upload_variant(&self, variant: &VariantDefinition) -> Result<UploadOutcome> {
        let target = self.config.upload_target();
        let key = target.key(self.config.stage(), &variant.table, &variant.entity)?;
        let file = self.sink.file(&variant.name).ok_or_else(|| {
            crate::error::Error::upload(&key, format!("no staging file for '{}'", variant.name))
        })?;

        Ok(match self.uploader.upload(file, &target, &key).await {
            Ok(uri) => UploadOutcome::uploaded(&variant.name, key, uri),
            Err(e) => UploadOutcome::failed(&variant.name, key, e.to_string()),
        })
    }

    fn stage_row(&mut self, routed: RoutedRow) -> Result<()> {
        match self.sink.append(&routed.variant, &routed.row) {
            Ok(()) => {
                self.summary.add_row(&routed.variant);
                Ok(())
            }
            Err(e) if e.is_record_level() => {
                let id = self
                    .entity
                    .id_field
                    .as_deref()
                    .and_then(|field| routed.row.get(field))
                    .filter(|id| !id.is_empty())
                    .unwrap_or(UNKNOWN_RECORD_ID);
                error!(variant = %routed.variant, record = %id, "Error processing item: {e}");
                self.summary
                    .failures
                    .push(RecordFailure::new(id, Some(routed.variant), e.to_string()));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn record_scan_progress(&mut self) {
        let state = self.scanner.state();
        self.summary.pages = state.pages_fetched;
        self.summary.records_scanned = state.records_fetched;
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.summary.state, to = %next, "Run state change");
        self.summary.state = next;
    }
}
