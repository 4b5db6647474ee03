use crate::ingest::{SourceDescriptor, SourceRegistry};

/// Every registered source in registration order
pub fn handle(registry: &SourceRegistry) -> Vec<SourceDescriptor> {
    registry.list_all().to_vec()
}
