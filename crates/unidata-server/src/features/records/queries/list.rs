use serde::Serialize;
use std::sync::Arc;
use unidata_common::{types::StoredRecord, UnidataError};

use crate::{
    query::{build_query, FilterParams, PageRequest, PaginationMeta, QueryError},
    store::RecordStore,
};

/// `GET /api/data` parameters: pagination plus field filters
#[derive(Debug, Clone)]
pub struct ListRecordsQuery {
    pub page: PageRequest,
    pub filters: FilterParams,
}

#[derive(Debug, Serialize)]
pub struct ListRecordsResponse {
    pub data: Vec<StoredRecord>,
    pub meta: PaginationMeta,
}

#[derive(Debug, thiserror::Error)]
pub enum ListRecordsError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Store(#[from] UnidataError),
}

fn take_integer(params: &mut FilterParams, key: &str) -> Result<Option<i64>, QueryError> {
    match params.remove(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| QueryError::InvalidValue {
                field: key.to_string(),
                value: raw,
                expected: "integer",
            }),
    }
}

impl ListRecordsQuery {
    /// Split the raw query string into pagination and filter parameters
    pub fn from_params(mut params: FilterParams) -> Result<Self, QueryError> {
        let page = take_integer(&mut params, "page")?;
        let limit = take_integer(&mut params, "limit")?;

        Ok(Self {
            page: PageRequest::from_parts(page, limit)?,
            filters: params,
        })
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn RecordStore>,
    query: ListRecordsQuery,
) -> Result<ListRecordsResponse, ListRecordsError> {
    let filters = build_query(&query.filters)?;

    let (data, total) = tokio::join!(store.find(&filters, &query.page), store.count(&filters));

    Ok(ListRecordsResponse {
        data: data?,
        meta: PaginationMeta::for_request(&query.page, total?),
    })
}
