//! CSV staging files
//!
//! Rows are appended to one local CSV file per output variant. The first row
//! written fixes the file's header; every later row must carry the same
//! columns in the same order.

use crate::error::{Error, Result, ResultExt};
use crate::loader::VariantDefinition;
use crate::transform::FlatRow;
use crate::types::StagingMode;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Staging file name for an output entity, e.g. `students_data.csv`
pub fn staging_file_name(entity: &str) -> String {
    format!("{entity}_data.csv")
}

/// One variant's local CSV artifact
pub struct StagingFile {
    variant: String,
    path: PathBuf,
    columns: Option<Vec<String>>,
    rows_written: usize,
    writer: Option<csv::Writer<File>>,
}

impl StagingFile {
    fn new(variant: impl Into<String>, path: PathBuf) -> Self {
        Self {
            variant: variant.into(),
            path,
            columns: None,
            rows_written: 0,
            writer: None,
        }
    }

    /// Variant this file stages
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Local path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Established column order, once the header exists
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Check if the header row exists
    pub fn header_written(&self) -> bool {
        self.columns.is_some()
    }

    /// Data rows appended during this run
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn writer(&mut self) -> Result<&mut csv::Writer<File>> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open staging file {}", self.path.display()))?;
            self.writer = Some(csv::WriterBuilder::new().has_headers(false).from_writer(file));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| Error::Other(format!("staging writer for '{}' unavailable", self.variant)))
    }

    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        let writer = self.writer()?;
        writer.write_record(columns)?;
        writer.flush()?;
        self.columns = Some(columns.to_vec());
        Ok(())
    }

    fn append(&mut self, row: &FlatRow) -> Result<()> {
        match &self.columns {
            Some(columns) if columns.as_slice() != row.columns() => {
                return Err(Error::Format {
                    variant: self.variant.clone(),
                    expected: columns.clone(),
                    actual: row.columns().to_vec(),
                });
            }
            Some(_) => {}
            None => self.write_header(row.columns())?,
        }

        let writer = self.writer()?;
        writer.write_record(row.values())?;
        writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl fmt::Debug for StagingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingFile")
            .field("variant", &self.variant)
            .field("path", &self.path)
            .field("columns", &self.columns)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

/// Append-only sink holding one staging file per variant
#[derive(Debug)]
pub struct StagingSink {
    dir: PathBuf,
    mode: StagingMode,
    files: BTreeMap<String, StagingFile>,
}

impl StagingSink {
    /// Create a sink writing under `dir`
    pub fn new(dir: impl AsRef<Path>, mode: StagingMode) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::config(format!(
                "Failed to create staging directory {}: {e}",
                dir.display()
            ))
        })?;

        Ok(Self {
            dir,
            mode,
            files: BTreeMap::new(),
        })
    }

    /// Staging directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register a variant's staging file before the scan starts
    ///
    /// In truncate mode a file left by a previous run is removed. In append
    /// mode its header is adopted and must match the variant's columns.
    pub fn prepare(&mut self, variant: &VariantDefinition) -> Result<&StagingFile> {
        let path = self.dir.join(staging_file_name(&variant.entity));
        let mut file = StagingFile::new(&variant.name, path);
        self.reset(&mut file)?;

        if let Some(existing) = &file.columns {
            let declared = variant.column_names();
            if *existing != declared {
                return Err(Error::config(format!(
                    "Staging file {} has header {existing:?} but variant '{}' declares {declared:?}",
                    file.path.display(),
                    variant.name
                )));
            }
        }

        Ok(self.files.entry(variant.name.clone()).or_insert(file))
    }

    /// Append one row to a variant's staging file
    ///
    /// The row is flushed before this returns. A row whose columns differ
    /// from the established header is rejected with [`Error::Format`] and
    /// nothing is written. The variant must have been prepared.
    pub fn append(&mut self, variant: &str, row: &FlatRow) -> Result<()> {
        let file = self
            .files
            .get_mut(variant)
            .ok_or_else(|| Error::Other(format!("staging file for '{variant}' was not prepared")))?;
        file.append(row)
    }

    /// Close a variant's file, writing a header-only file if it got no rows
    pub fn finalize(&mut self, variant: &VariantDefinition) -> Result<&StagingFile> {
        if !self.files.contains_key(&variant.name) {
            self.prepare(variant)?;
        }

        let file = self
            .files
            .get_mut(&variant.name)
            .ok_or_else(|| Error::Other(format!("staging file for '{}' missing", variant.name)))?;

        if !file.header_written() {
            warn!(
                variant = %variant.name,
                path = %file.path.display(),
                "No rows staged, writing header-only file"
            );
            file.write_header(&variant.column_names())?;
        }
        file.close()?;

        info!(
            variant = %variant.name,
            path = %file.path.display(),
            rows = file.rows_written,
            "Staging file complete"
        );
        Ok(file)
    }

    /// Staging file of a variant
    pub fn file(&self, variant: &str) -> Option<&StagingFile> {
        self.files.get(variant)
    }

    /// All staging files, ordered by variant name
    pub fn files(&self) -> impl Iterator<Item = &StagingFile> {
        self.files.values()
    }

    fn reset(&self, file: &mut StagingFile) -> Result<()> {
        match self.mode {
            StagingMode::Truncate => match std::fs::remove_file(&file.path) {
                Ok(()) => {
                    debug!(path = %file.path.display(), "Removed stale staging file");
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            StagingMode::Append => {
                let has_content = std::fs::metadata(&file.path).is_ok_and(|m| m.len() > 0);
                if has_content {
                    let context = || format!("Failed to read staging file {}", file.path.display());
                    let mut reader = csv::Reader::from_path(&file.path).with_context(context)?;
                    let header: Vec<String> = reader
                        .headers()
                        .with_context(context)?
                        .iter()
                        .map(String::from)
                        .collect();
                    debug!(path = %file.path.display(), "Appending to existing staging file");
                    file.columns = Some(header);
                }
                Ok(())
            }
        }
    }
}
