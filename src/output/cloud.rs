//! Blob storage upload (S3, R2, GCS, Azure, local filesystem)

use super::staging::StagingFile;
use crate::error::{Error, Result};
use crate::template::{self, TemplateContext};
use crate::types::Stage;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::info;

/// Where one variant's staging file is uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Bucket name, logged with each upload
    pub bucket: String,
    /// Key template, e.g. `{stage}/{table}/{entity}_data.csv`
    pub key_template: String,
}

impl UploadTarget {
    /// Create a target
    pub fn new(bucket: impl Into<String>, key_template: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key_template: key_template.into(),
        }
    }

    /// Resolve the object key of one output variant
    pub fn key(&self, stage: Stage, table: &str, entity: &str) -> Result<String> {
        let ctx = TemplateContext::for_output(stage, table, entity);
        template::render(&self.key_template, &ctx)
    }
}

/// Cloud storage destination parsed from URL
#[derive(Debug, Clone)]
pub struct CloudDestination {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
}

impl CloudDestination {
    /// Parse a destination URL and create appropriate object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/` or `./path/` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else {
            Self::parse_local(url)
        }
    }

    /// Split `bucket/prefix` after the scheme
    fn split_bucket<'a>(url: &'a str, scheme: &str) -> Result<(&'a str, String)> {
        let without_scheme = url
            .strip_prefix(&format!("{scheme}://"))
            .ok_or_else(|| Error::config(format!("Invalid {scheme} URL: {url}")))?;

        let (bucket, prefix) = match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].to_string(),
            ),
            None => (without_scheme, String::new()),
        };

        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in URL: {url}")));
        }
        Ok((bucket, prefix))
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = Self::split_bucket(url, scheme)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 needs its account endpoint; AWS_ENDPOINT is already read by from_env()
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let (bucket, prefix) = Self::split_bucket(url, "gs")?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let (container, prefix) = Self::split_bucket(url, "az")?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
        })
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Object path a key lands at, including the URL prefix
    pub fn object_path(&self, key: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{key}", self.prefix.trim_end_matches('/')))
        }
    }

    /// Write bytes to a key, replacing any existing object
    pub async fn write(&self, key: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(key);

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::upload(key, format!("Failed to write {path}: {e}")))?;

        Ok(format!("{}://{path}", self.scheme))
    }

    /// Read an object back
    pub async fn read(&self, key: &str) -> Result<Bytes> {
        let path = self.object_path(key);
        let result = self.store.get(&path).await?;
        Ok(result.bytes().await?)
    }
}

/// Pushes finished staging files to the destination
#[derive(Debug, Clone)]
pub struct Uploader {
    destination: CloudDestination,
}

impl Uploader {
    /// Create an uploader for a destination
    pub fn new(destination: CloudDestination) -> Self {
        Self { destination }
    }

    /// Create an uploader from a destination URL
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(CloudDestination::parse(url)?))
    }

    /// Destination uploads go to
    pub fn destination(&self) -> &CloudDestination {
        &self.destination
    }

    /// Upload a staging file in full to `key` of the target bucket
    ///
    /// Overwrites whatever is stored at the key.
    pub async fn upload(&self, file: &StagingFile, target: &UploadTarget, key: &str) -> Result<String> {
        info!(
            variant = file.variant(),
            bucket = %target.bucket,
            key,
            "Uploading CSV"
        );

        let data = tokio::fs::read(file.path()).await.map_err(|e| {
            Error::upload(
                key,
                format!("Failed to read staging file {}: {e}", file.path().display()),
            )
        })?;
        let size = data.len();

        let uri = self.destination.write(key, Bytes::from(data)).await?;
        info!(variant = file.variant(), uri = %uri, bytes = size, "File uploaded successfully");
        Ok(uri)
    }
}
