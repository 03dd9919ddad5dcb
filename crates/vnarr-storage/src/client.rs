//! Object store seam and the S3-compatible client behind it.

use std::fmt;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Information about a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp (milliseconds since epoch)
    pub last_modified: Option<u64>,
}

/// Durable object storage used by the pipeline.
///
/// Keys are the addressing scheme; public URLs are derived from the key
/// without a round trip.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`.
    async fn put_bytes(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// List objects under `prefix`, in the order the backend returns them.
    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    /// Externally resolvable URL of `key`.
    fn public_url(&self, key: &str) -> String;
}

/// Configuration for the S3-compatible client.
#[derive(Clone)]
pub struct StorageConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto")
    pub region: String,
    /// Base for public object URLs
    pub public_base_url: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let bucket_name = std::env::var("BUCKET_NAME")
            .map_err(|_| StorageError::config_error("BUCKET_NAME not set"))?;

        Ok(Self {
            endpoint_url: std::env::var("AWS_ENDPOINT_URL_S3")
                .map_err(|_| StorageError::config_error("AWS_ENDPOINT_URL_S3 not set"))?,
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("AWS_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("AWS_SECRET_ACCESS_KEY not set"))?,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("STORAGE_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| default_public_base_url(&bucket_name)),
            bucket_name,
        })
    }
}

/// Public URL base for a bucket when none is configured.
pub fn default_public_base_url(bucket: &str) -> String {
    format!("https://{}.fly.storage.tigris.dev", bucket)
}

fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

/// S3-compatible bucket client.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Store {
    /// Create a new client from configuration.
    pub fn new(config: StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vnarr",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(StorageConfig::from_env()?))
    }

    /// Bucket this client writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::config_error(format!("Bucket connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_bytes(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        let len = data.len();
        debug!("Uploading {} bytes to {}", len, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} bytes to {}", len, key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects with prefix: {}", prefix);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::list_failed(e.to_string()))?;

            for obj in response.contents() {
                let Some(key) = obj.key() else { continue };
                objects.push(ObjectInfo {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj
                        .last_modified()
                        .and_then(|t| t.to_millis().ok())
                        .map(|ms| ms as u64),
                });
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base_url, key)
    }
}
