use std::env;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, Client};
use bytes::Bytes;

use crate::{BlobError, BlobResult, BlobStore, PutOptions, PutResult};

/// S3-compatible storage configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible services (MinIO, RustFS, R2...)
    pub endpoint_url: Option<String>,
}

impl S3Config {
    /// Read configuration from `MEDIA_S3_*` environment variables
    pub fn from_env() -> BlobResult<Self> {
        fn get_env(key: &str) -> BlobResult<String> {
            env::var(key).map_err(|_| BlobError::invalid(format!("{} environment variable required", key)))
        }

        Ok(Self {
            bucket: get_env("MEDIA_S3_BUCKET")?,
            region: get_env("MEDIA_S3_REGION")?,
            access_key_id: get_env("MEDIA_S3_ACCESS_KEY_ID")?,
            secret_access_key: get_env("MEDIA_S3_SECRET_ACCESS_KEY")?,
            endpoint_url: env::var("MEDIA_S3_ENDPOINT_URL").ok().filter(|v| !v.is_empty()),
        })
    }
}

/// Object store backed by the AWS SDK (works with any S3-compatible service)
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> Self {
        let bucket = config.bucket.clone();
        let client = Self::create_client(config).await;
        Self { client, bucket }
    }

    pub async fn from_env() -> BlobResult<Self> {
        Ok(Self::new(S3Config::from_env()?).await)
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    async fn create_client(config: S3Config) -> Client {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "media-blob",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);

        let custom_endpoint = config.endpoint_url.is_some();
        if let Some(endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                // path style is what self-hosted S3 clones expect
                .force_path_style(custom_endpoint)
                .build(),
        )
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> BlobError {
        BlobError::backend(err)
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn put(&self, key: &str, body: Bytes, options: PutOptions) -> BlobResult<PutResult> {
        let size_bytes = body.len() as u64;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(AwsByteStream::from(body));

        if let Some(ct) = options.content_type {
            request = request.content_type(ct);
        }
        if let Some(cc) = options.cache_control {
            request = request.cache_control(cc);
        }

        let result = request.send().await.map_err(Self::map_aws_error)?;
        tracing::debug!(bucket = %self.bucket, key, size_bytes, "put object");

        Ok(PutResult {
            etag: result.e_tag,
            size_bytes,
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        // DeleteObject succeeds for absent keys
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(Self::map_aws_error)?;
        tracing::debug!(bucket = %self.bucket, key, "deleted object");
        Ok(())
    }
}
