//! S3 object storage transport

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

use crate::ingest::{
    decoder::ByteChunkStream,
    fetcher::{ObjectLocation, ObjectTransport},
};

pub mod config;

pub use config::ObjectStoreConfig;

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub async fn new(config: &ObjectStoreConfig) -> Self {
        debug!("Initializing object storage with config: {:?}", config);

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "unidata-static",
            ));
        }

        let shared = loader.load().await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(region = %config.region, endpoint = ?config.endpoint, "Object storage client initialized");

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectTransport for S3ObjectStore {
    fn name(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self), fields(bucket = %location.bucket, key = %location.key))]
    async fn get_object(&self, location: &ObjectLocation) -> Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .with_context(|| format!("Failed to get s3://{}/{}", location.bucket, location.key))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes();

        if data.is_empty() {
            bail!("s3://{}/{} has an empty body", location.bucket, location.key);
        }

        debug!("Downloaded {} bytes", data.len());
        Ok(data)
    }

    #[instrument(skip(self), fields(bucket = %location.bucket, key = %location.key))]
    async fn open_object(&self, location: &ObjectLocation) -> Result<ByteChunkStream> {
        let response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .with_context(|| {
                format!("Failed to open s3://{}/{}", location.bucket, location.key)
            })?;

        if response.content_length() == Some(0) {
            bail!("s3://{}/{} has an empty body", location.bucket, location.key);
        }

        debug!(content_length = ?response.content_length(), "Streaming object");
        Ok(ReaderStream::new(response.body.into_async_read()).boxed())
    }
}
