use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use apirun_core::api::{ObjectStore, PublishConfig, PublishError};

/// S3-backed [`ObjectStore`]. Credentials come from the default AWS chain.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn connect(cfg: &PublishConfig) -> Result<Self, PublishError> {
        let bucket = cfg.bucket.trim();
        if bucket.is_empty() {
            return Err(PublishError::Invalid("bucket must be set".to_string()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &cfg.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if cfg.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(s3_builder.build()),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn location(&self) -> String {
        format!("s3://{}", self.bucket)
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> Result<(), PublishError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|err| PublishError::Io {
                path: path.display().to_string(),
                source: std::io::Error::other(err.to_string()),
            })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }
        request.send().await.map_err(|err| PublishError::Upload {
            key: key.to_string(),
            message: DisplayErrorContext(&err).to_string(),
        })?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, PublishError> {
        let presign = PresigningConfig::expires_in(expires_in).map_err(|err| {
            PublishError::Presign {
                key: key.to_string(),
                message: err.to_string(),
            }
        })?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign)
            .await
            .map_err(|err| PublishError::Presign {
                key: key.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(request.uri().to_string())
    }
}
