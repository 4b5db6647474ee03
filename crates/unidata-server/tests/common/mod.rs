//! Shared fixtures for the integration tests

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use unidata_server::{
    ingest::{
        decoder::ByteChunkStream, Fetcher, IngestConfig, IngestOrchestrator, ObjectLocation,
        ObjectTransport, SourceRegistry,
    },
    store::{MemoryRecordStore, RecordStore},
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const SOURCE1_PATH: &str = "/datasets/structured.json";
pub const SOURCE2_PATH: &str = "/datasets/large.json";

/// Ingestion config whose sources point at the mock server
pub fn config_for(server: &MockServer) -> IngestConfig {
    let mut config = IngestConfig::default();
    config.source1.url = format!("{}{}", server.uri(), SOURCE1_PATH);
    config.source2.url = format!("{}{}", server.uri(), SOURCE2_PATH);
    config
}

/// Serve `body` for every GET of `route`
pub async fn serve_json(server: &MockServer, route: &str, body: &Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json"),
        )
        .mount(server)
        .await;
}

pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Object storage that is always unreachable
pub struct UnreachableStorage;

#[async_trait]
impl ObjectTransport for UnreachableStorage {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get_object(&self, location: &ObjectLocation) -> anyhow::Result<Bytes> {
        anyhow::bail!("access denied for {}/{}", location.bucket, location.key)
    }

    async fn open_object(&self, location: &ObjectLocation) -> anyhow::Result<ByteChunkStream> {
        anyhow::bail!("access denied for {}/{}", location.bucket, location.key)
    }
}

/// Object storage serving fixed bodies by key, streamed in small chunks
#[derive(Default)]
pub struct StaticStorage {
    objects: HashMap<String, Bytes>,
    chunk_size: usize,
}

impl StaticStorage {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            objects: HashMap::new(),
            chunk_size,
        }
    }

    pub fn with_object(mut self, route: &str, body: &Value) -> Self {
        self.objects.insert(
            route.trim_start_matches('/').to_string(),
            Bytes::from(body.to_string()),
        );
        self
    }

    /// Store `body` verbatim, even when it is empty
    pub fn with_raw(mut self, route: &str, body: &'static [u8]) -> Self {
        self.objects.insert(
            route.trim_start_matches('/').to_string(),
            Bytes::from_static(body),
        );
        self
    }

    fn lookup(&self, location: &ObjectLocation) -> anyhow::Result<Bytes> {
        self.objects
            .get(&location.key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("NoSuchKey: {}", location.key))
    }
}

#[async_trait]
impl ObjectTransport for StaticStorage {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_object(&self, location: &ObjectLocation) -> anyhow::Result<Bytes> {
        self.lookup(location)
    }

    async fn open_object(&self, location: &ObjectLocation) -> anyhow::Result<ByteChunkStream> {
        let body = self.lookup(location)?;
        let chunks: Vec<std::io::Result<Bytes>> = body
            .chunks(self.chunk_size.max(1))
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}

/// Object storage whose streams break with an I/O error after `prefix`
pub struct BrokenStreamStorage {
    pub prefix: &'static str,
}

#[async_trait]
impl ObjectTransport for BrokenStreamStorage {
    fn name(&self) -> &'static str {
        "broken-stream"
    }

    async fn get_object(&self, location: &ObjectLocation) -> anyhow::Result<Bytes> {
        anyhow::bail!("connection reset reading {}", location.key)
    }

    async fn open_object(&self, _location: &ObjectLocation) -> anyhow::Result<ByteChunkStream> {
        let chunks: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(self.prefix.as_bytes())),
            Err(std::io::Error::other("connection reset")),
        ];
        Ok(stream::iter(chunks).boxed())
    }
}

/// Orchestrator over an in-memory store, fetching through `primary` then HTTP
pub fn orchestrator(
    config: &IngestConfig,
    primary: Option<Arc<dyn ObjectTransport>>,
) -> (IngestOrchestrator, Arc<MemoryRecordStore>) {
    let store = Arc::new(MemoryRecordStore::new());
    let http = reqwest::Client::new();
    let orchestrator = IngestOrchestrator::new(
        Arc::new(SourceRegistry::from_config(config).unwrap()),
        Arc::new(Fetcher::new(primary, http)),
        store.clone() as Arc<dyn RecordStore>,
        config,
    );
    (orchestrator, store)
}
