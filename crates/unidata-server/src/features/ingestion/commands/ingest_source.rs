use serde::{Deserialize, Serialize};
use unidata_common::{Result, UnidataError};

use crate::ingest::IngestOrchestrator;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSourceCommand {
    pub source_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSourceResponse {
    pub success: bool,
    pub source_id: String,
    pub count: u64,
}

impl IngestSourceCommand {
    pub fn validate(&self) -> Result<()> {
        if self.source_id.trim().is_empty() {
            return Err(UnidataError::SourceNotFound(self.source_id.clone()));
        }
        Ok(())
    }
}

/// Run one ingestion to completion and report how many records were upserted
#[tracing::instrument(skip(orchestrator))]
pub async fn handle(
    orchestrator: &IngestOrchestrator,
    command: IngestSourceCommand,
) -> Result<IngestSourceResponse> {
    command.validate()?;

    let count = orchestrator.ingest_one(&command.source_id).await?;

    Ok(IngestSourceResponse {
        success: true,
        source_id: command.source_id,
        count,
    })
}
