use serde::Serialize;
use std::collections::BTreeMap;

use crate::ingest::IngestOrchestrator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAllResponse {
    pub success: bool,
    pub results: BTreeMap<String, u64>,
    pub total_count: u64,
}

impl IngestAllResponse {
    pub fn from_results(results: BTreeMap<String, u64>) -> Self {
        let total_count = results.values().sum();
        Self {
            success: true,
            results,
            total_count,
        }
    }
}

/// Ingest every registered source; failed sources report a count of 0
#[tracing::instrument(skip(orchestrator))]
pub async fn handle(orchestrator: &IngestOrchestrator) -> IngestAllResponse {
    IngestAllResponse::from_results(orchestrator.ingest_all().await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_results() {
        let results = BTreeMap::from([("source1".to_string(), 3), ("source2".to_string(), 0)]);
        let response = IngestAllResponse::from_results(results);
        assert_eq!(response.total_count, 3);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": true,
                "results": {"source1": 3, "source2": 0},
                "totalCount": 3
            })
        );
    }
}
