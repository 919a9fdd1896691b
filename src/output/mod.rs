//! Output module
//!
//! Handles local CSV staging and the final upload to blob storage.
//!
//! # Overview
//!
//! This module provides:
//! - `StagingSink` - one append-only CSV file per output variant
//! - `UploadTarget` - bucket and key template resolution
//! - `Uploader` - cloud storage output (S3, R2, GCS, Azure, local)

mod cloud;
mod staging;

pub use cloud::{CloudDestination, UploadTarget, Uploader};
pub use staging::{staging_file_name, StagingFile, StagingSink};
