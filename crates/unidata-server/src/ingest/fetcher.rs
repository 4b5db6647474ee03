//! Dataset retrieval with object-storage-first, HTTP-fallback semantics
//!
//! Every dataset URL is tried through the primary [`ObjectTransport`] first
//! (bucket taken from the first host label, key from the path). Any failure
//! there, including a URL that does not look like an object-storage URL, is
//! retried as a plain HTTP GET of the original URL.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, stream, StreamExt, TryStreamExt};
use std::{io, sync::Arc, time::Duration};
use tracing::{debug, instrument, warn};
use unidata_common::{Result, UnidataError};
use url::Url;

use super::{config::IngestConfig, decoder::ByteChunkStream};
use crate::storage::{ObjectStoreConfig, S3ObjectStore};

/// Bucket and key addressed by a dataset URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Derive the location from a virtual-hosted style URL such as
    /// `https://my-bucket.s3.eu-north-1.amazonaws.com/path/data.json`.
    ///
    /// The host must have at least two labels and the key must be non-empty.
    pub fn parse(url: &str) -> anyhow::Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| anyhow!("URL has no host: {}", url))?;

        let mut labels = host.split('.');
        let bucket = labels.next().unwrap_or_default();
        if bucket.is_empty() || labels.next().is_none() {
            bail!("Cannot derive a bucket from host '{}'", host);
        }

        let key = parsed.path().trim_start_matches('/');
        if key.is_empty() {
            bail!("URL has no object key: {}", url);
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

/// A transport able to read whole objects or stream them
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Read the whole object; an empty body is an error
    async fn get_object(&self, location: &ObjectLocation) -> anyhow::Result<Bytes>;

    /// Open the object as a chunk stream; an empty body is an error
    async fn open_object(&self, location: &ObjectLocation) -> anyhow::Result<ByteChunkStream>;
}

/// Fetches dataset bodies, falling back from object storage to HTTP
pub struct Fetcher {
    primary: Option<Arc<dyn ObjectTransport>>,
    http: reqwest::Client,
}

impl Fetcher {
    pub fn new(primary: Option<Arc<dyn ObjectTransport>>, http: reqwest::Client) -> Self {
        Self { primary, http }
    }

    /// Fetcher that only speaks plain HTTP
    pub fn http_only(config: &IngestConfig) -> anyhow::Result<Self> {
        Ok(Self::new(None, build_http_client(config)?))
    }

    /// Fetcher with an S3 primary transport unless object storage is disabled
    pub async fn from_config(
        storage: &ObjectStoreConfig,
        config: &IngestConfig,
    ) -> anyhow::Result<Self> {
        let primary: Option<Arc<dyn ObjectTransport>> = if storage.enabled {
            Some(Arc::new(S3ObjectStore::new(storage).await))
        } else {
            debug!("Object storage disabled, datasets are fetched over HTTP only");
            None
        };

        Ok(Self::new(primary, build_http_client(config)?))
    }

    /// Retrieve a complete dataset body
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, url: &str) -> Result<Bytes> {
        let primary_error = match &self.primary {
            Some(transport) => match Self::locate(url) {
                Ok(location) => transport.get_object(&location).await,
                Err(e) => Err(e),
            },
            None => Err(anyhow!("object storage disabled")),
        };

        let primary_error = match primary_error {
            Ok(body) => return Ok(body),
            Err(e) => self.note_fallback(url, e),
        };

        self.http_fetch_all(url)
            .await
            .map_err(|http_error| fetch_error(url, &primary_error, &http_error))
    }

    /// Open a dataset body as a chunk stream
    #[instrument(skip(self))]
    pub async fn open_stream(&self, url: &str) -> Result<ByteChunkStream> {
        let primary_error = match &self.primary {
            Some(transport) => match Self::locate(url) {
                Ok(location) => match transport.open_object(&location).await {
                    Ok(stream) => non_empty(stream).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            },
            None => Err(anyhow!("object storage disabled")),
        };

        let primary_error = match primary_error {
            Ok(stream) => return Ok(stream),
            Err(e) => self.note_fallback(url, e),
        };

        self.http_open_stream(url)
            .await
            .map_err(|http_error| fetch_error(url, &primary_error, &http_error))
    }

    fn locate(url: &str) -> anyhow::Result<ObjectLocation> {
        ObjectLocation::parse(url).context("Not an object storage URL")
    }

    fn note_fallback(&self, url: &str, error: anyhow::Error) -> anyhow::Error {
        match &self.primary {
            Some(transport) => warn!(
                url,
                transport = transport.name(),
                error = %format!("{:#}", error),
                "Object storage fetch failed, falling back to HTTP"
            ),
            None => debug!(url, "Fetching over HTTP"),
        }
        error
    }

    async fn http_get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("HTTP request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} from {}", status, url);
        }
        Ok(response)
    }

    async fn http_fetch_all(&self, url: &str) -> anyhow::Result<Bytes> {
        let body = self
            .http_get(url)
            .await?
            .bytes()
            .await
            .context("Failed to read HTTP response body")?;
        debug!(bytes = body.len(), "Fetched over HTTP");
        Ok(body)
    }

    async fn http_open_stream(&self, url: &str) -> anyhow::Result<ByteChunkStream> {
        let response = self.http_get(url).await?;
        Ok(response.bytes_stream().map_err(io::Error::other).boxed())
    }
}

/// Wait for the first non-empty chunk so an empty object fails before decoding starts
async fn non_empty(mut body: ByteChunkStream) -> anyhow::Result<ByteChunkStream> {
    loop {
        match body.next().await {
            None => bail!("object has an empty body"),
            Some(Err(e)) => return Err(e).context("Failed to read object body"),
            Some(Ok(chunk)) if chunk.is_empty() => continue,
            Some(Ok(chunk)) => {
                return Ok(stream::once(future::ready(Ok(chunk))).chain(body).boxed());
            },
        }
    }
}

/// Re-tag a read failure in the middle of a body as a fetch failure of `url`
pub fn body_error(url: &str, error: UnidataError) -> UnidataError {
    match error {
        UnidataError::Io(e) => UnidataError::Fetch {
            url: url.to_string(),
            reason: format!("body read failed: {}", e),
        },
        other => other,
    }
}

fn fetch_error(url: &str, primary: &anyhow::Error, http: &anyhow::Error) -> UnidataError {
    UnidataError::Fetch {
        url: url.to_string(),
        reason: format!("object storage: {:#}; http: {:#}", primary, http),
    }
}

/// HTTP client used for the fallback path
pub fn build_http_client(config: &IngestConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.http_connect_timeout_secs))
        .user_agent(concat!("unidata/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}
