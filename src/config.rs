//! Run configuration
//!
//! A [`RunConfig`] is resolved once before any I/O and handed by reference to
//! every component of the export pipeline. Nothing reads process-wide state
//! after it has been built.

use crate::error::{Error, Result};
use crate::output::UploadTarget;
use crate::template::{self, TemplateContext, DEFAULT_KEY_TEMPLATE, DEFAULT_SOURCE_TABLE_TEMPLATE};
use crate::types::{OptionStringExt, Stage, StagingMode};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Bucket the analytics exports land in unless overridden
pub const DEFAULT_BUCKET: &str = "ciencia-datos-bucket-rockie";

/// Region of the source tables and the bucket
pub const DEFAULT_REGION: &str = "us-east-1";

/// Immutable configuration for one export run
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    stage: Stage,
    entity: String,
    bucket: String,
    destination: Option<String>,
    staging_dir: PathBuf,
    page_size: Option<u32>,
    region: String,
    staging_mode: StagingMode,
    key_template: String,
}

impl RunConfig {
    /// Start building a config
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Target stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Entity name or definition path the run exports
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Target bucket
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Destination URL uploads are written to
    ///
    /// Defaults to `s3://{bucket}`.
    pub fn destination_url(&self) -> String {
        self.destination
            .clone()
            .unwrap_or_else(|| format!("s3://{}", self.bucket))
    }

    /// Directory holding the staging files
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Maximum items per scan page, if bounded
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// AWS region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Staging file policy
    pub fn staging_mode(&self) -> StagingMode {
        self.staging_mode
    }

    /// Object key template
    pub fn key_template(&self) -> &str {
        &self.key_template
    }

    /// Identifier used to tag every log line of the run
    pub fn run_id(&self, entity_name: &str) -> String {
        format!("ingesta_{}_{entity_name}", self.stage)
    }

    /// Physical source table name, e.g. `dev_t_students`
    pub fn source_table(&self, logical_table: &str) -> Result<String> {
        let mut ctx = TemplateContext::new();
        ctx.set("stage", self.stage.as_str())
            .set("table", logical_table);
        template::render(DEFAULT_SOURCE_TABLE_TEMPLATE, &ctx)
    }

    /// Bucket and key template uploads resolve against
    pub fn upload_target(&self) -> UploadTarget {
        UploadTarget::new(&self.bucket, &self.key_template)
    }

    /// Object key for one output variant, e.g. `dev/t_promos/promos_data.csv`
    pub fn object_key(&self, table: &str, entity: &str) -> Result<String> {
        self.upload_target().key(self.stage, table, entity)
    }
}

/// Builder for [`RunConfig`]
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    stage: Option<String>,
    entity: Option<String>,
    bucket: Option<String>,
    destination: Option<String>,
    staging_dir: Option<PathBuf>,
    page_size: Option<u32>,
    region: Option<String>,
    staging_mode: StagingMode,
    key_template: Option<String>,
}

impl RunConfigBuilder {
    /// Set the stage selector (validated on build)
    #[must_use]
    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Set the entity name or definition path
    #[must_use]
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the target bucket
    #[must_use]
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Override the destination URL (local path, s3://, r2://, gs://, az://)
    #[must_use]
    pub fn destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Set the staging directory
    #[must_use]
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Bound the number of items per scan page
    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Set the AWS region
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the staging file policy
    #[must_use]
    pub fn staging_mode(mut self, mode: StagingMode) -> Self {
        self.staging_mode = mode;
        self
    }

    /// Override the object key template
    #[must_use]
    pub fn key_template(mut self, template: impl Into<String>) -> Self {
        self.key_template = Some(template.into());
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<RunConfig> {
        let stage = self
            .stage
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("stage"))?
            .trim()
            .parse::<Stage>()?;

        let entity = self
            .entity
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("entity"))?;

        let bucket = self
            .bucket
            .none_if_empty()
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());
        if bucket.contains('/') {
            return Err(Error::InvalidConfigValue {
                field: "bucket".to_string(),
                message: format!("'{bucket}' must be a bare bucket name"),
            });
        }

        if self.page_size == Some(0) {
            return Err(Error::InvalidConfigValue {
                field: "page_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let key_template = self
            .key_template
            .none_if_empty()
            .unwrap_or_else(|| DEFAULT_KEY_TEMPLATE.to_string());
        template::validate_key_template(&key_template)?;

        Ok(RunConfig {
            stage,
            entity,
            bucket,
            destination: self.destination.none_if_empty(),
            staging_dir: self.staging_dir.unwrap_or_else(std::env::temp_dir),
            page_size: self.page_size,
            region: self
                .region
                .none_if_empty()
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            staging_mode: self.staging_mode,
            key_template,
        })
    }
}
