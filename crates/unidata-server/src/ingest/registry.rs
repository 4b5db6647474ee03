//! Catalog of ingestible sources
//!
//! Built once at startup from [`IngestConfig`] and shared read-only.

use serde::Serialize;
use unidata_common::{Result, UnidataError};

use super::{
    config::{IngestConfig, IngestInterval, SourceEndpoint},
    transform::{self, TransformFn},
};

/// How a source's body is retrieved and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Download the whole body, then decode it
    Whole,
    /// Decode array elements while the body is streaming in
    Streaming,
}

/// Everything needed to ingest one source
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(skip)]
    pub transform: TransformFn,
    pub ingest_interval: IngestInterval,
    pub fetch_mode: FetchMode,
}

impl SourceDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        endpoint: &SourceEndpoint,
        transform: TransformFn,
        fetch_mode: FetchMode,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: endpoint.url.clone(),
            transform,
            ingest_interval: endpoint.interval.clone(),
            fetch_mode,
        }
    }
}

/// Ordered set of source descriptors with unique ids
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog with URLs and intervals from configuration
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(SourceDescriptor::new(
            "source1",
            "Structured Data",
            &config.source1,
            transform::structured_listing,
            FetchMode::Whole,
        ))?;
        registry.register(SourceDescriptor::new(
            "source2",
            "Large Data",
            &config.source2,
            transform::flat_listing,
            FetchMode::Streaming,
        ))?;
        Ok(registry)
    }

    /// Add a source; ids must be unique
    pub fn register(&mut self, descriptor: SourceDescriptor) -> Result<()> {
        if self.find(&descriptor.id).is_some() {
            return Err(UnidataError::Config(format!(
                "Source '{}' is already registered",
                descriptor.id
            )));
        }
        self.sources.push(descriptor);
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// All sources in registration order
    pub fn list_all(&self) -> &[SourceDescriptor] {
        &self.sources
    }
}
