//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, ExportArgs, OutputFormat};
use crate::config::RunConfig;
use crate::engine::{ExportEngine, RunSummary};
use crate::entities::list_builtin;
use crate::error::Result;
use crate::loader::{load_entity, EntityDefinition};
use crate::scan::{DynamoDbSource, MemorySource, TableSource, DEFAULT_PAGE_SIZE};
use crate::types::StagingMode;
use serde_json::{json, Value};

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Finished without anything to report
    Success,
    /// Export reached DONE but skipped records or failed uploads (`--strict`)
    CompletedWithFailures,
}

impl RunOutcome {
    /// Process exit code
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::CompletedWithFailures => 2,
        }
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<RunOutcome> {
        match &self.cli.command {
            Commands::Export(args) => self.export(args).await,
            Commands::Entities => self.list_entities(),
            Commands::Catalog { entity } => self.catalog(entity),
            Commands::Validate { entity } => self.validate(entity),
        }
    }

    /// Export one entity
    ///
    /// Configuration and the entity definition are resolved before any
    /// network or file I/O happens.
    async fn export(&self, args: &ExportArgs) -> Result<RunOutcome> {
        let config = build_config(args)?;
        let entity = load_entity(config.entity())?;
        let table = config.source_table(&entity.source_table)?;

        let summary = match &args.input {
            Some(path) => {
                let page_size = config
                    .page_size()
                    .map_or(DEFAULT_PAGE_SIZE, |size| size as usize);
                let source = MemorySource::from_jsonl_file(&table, path, page_size)?;
                Self::run_engine(&config, &entity, source).await?
            }
            None => {
                let source = DynamoDbSource::from_env(config.region(), &table)
                    .await
                    .with_page_size(config.page_size());
                Self::run_engine(&config, &entity, source).await?
            }
        };

        self.output_summary(&summary);

        if args.strict && summary.has_failures() {
            Ok(RunOutcome::CompletedWithFailures)
        } else {
            Ok(RunOutcome::Success)
        }
    }

    async fn run_engine<S: TableSource>(
        config: &RunConfig,
        entity: &EntityDefinition,
        source: S,
    ) -> Result<RunSummary> {
        let mut engine = ExportEngine::from_config(config, entity, source)?;
        engine.run().await
    }

    /// List built-in entities
    fn list_entities(&self) -> Result<RunOutcome> {
        let mut entities = Vec::new();
        for name in list_builtin() {
            let def = load_entity(name)?;
            entities.push(json!({
                "name": def.name,
                "source_table": def.source_table,
                "variants": def.variant_names(),
            }));
        }

        self.output_message(&json!({
            "type": "ENTITIES",
            "entities": entities
        }));

        Ok(RunOutcome::Success)
    }

    /// Print the catalog of an entity
    fn catalog(&self, entity: &str) -> Result<RunOutcome> {
        let def = load_entity(entity)?;

        self.output_message(&json!({
            "type": "CATALOG",
            "entity": def.name,
            "tables": def.catalog()
        }));

        Ok(RunOutcome::Success)
    }

    /// Validate an entity definition
    fn validate(&self, entity: &str) -> Result<RunOutcome> {
        let def = load_entity(entity)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Entity '{}' is valid with {} variants",
                    def.name,
                    def.variants.len()
                )
            }
        }));

        Ok(RunOutcome::Success)
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }

    fn output_summary(&self, summary: &RunSummary) {
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!({
                "type": "SUMMARY",
                "summary": summary
            })),
            OutputFormat::Pretty => println!("{}", render_summary(summary)),
        }
    }
}

/// Build the run configuration from CLI arguments
pub(crate) fn build_config(args: &ExportArgs) -> Result<RunConfig> {
    let mut builder = RunConfig::builder();

    if let Some(stage) = &args.stage {
        builder = builder.stage(stage);
    }
    if let Some(entity) = &args.entity {
        builder = builder.entity(entity);
    }
    if let Some(bucket) = &args.bucket {
        builder = builder.bucket(bucket);
    }
    if let Some(destination) = &args.destination {
        builder = builder.destination(destination);
    }
    if let Some(dir) = &args.staging_dir {
        builder = builder.staging_dir(dir);
    }
    if let Some(size) = args.page_size {
        builder = builder.page_size(size);
    }
    if let Some(region) = &args.region {
        builder = builder.region(region);
    }
    if let Some(template) = &args.key_template {
        builder = builder.key_template(template);
    }
    if args.append_staging {
        builder = builder.staging_mode(StagingMode::Append);
    }

    builder.build()
}

/// Human-readable run report
fn render_summary(summary: &RunSummary) -> String {
    let mut lines = vec![
        format!("Run {} [{}]", summary.run_id, summary.state),
        format!(
            "  scanned {} records in {} pages ({} ms)",
            summary.records_scanned, summary.pages, summary.duration_ms
        ),
    ];

    for (variant, rows) in &summary.rows {
        lines.push(format!("  {variant}: {rows} rows"));
    }
    for upload in &summary.uploads {
        match (&upload.uploaded, &upload.error) {
            (Some(uri), _) => lines.push(format!("  uploaded {uri}")),
            (None, Some(error)) => lines.push(format!("  FAILED {}: {error}", upload.key)),
            (None, None) => {}
        }
    }
    if !summary.failures.is_empty() {
        lines.push(format!("  skipped {} records:", summary.failures.len()));
        for failure in &summary.failures {
            lines.push(format!("    {}: {}", failure.id, failure.reason));
        }
    }

    lines.join("\n")
}
