//! Postgres-backed record store
//!
//! Filters are rendered with [`QueryBuilder`] so every user-supplied value is
//! a bound parameter. Column names come only from [`QueryField::column`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use unidata_common::{
    types::{RawData, StoredRecord, UnifiedRecord},
    Result, UnidataError,
};

use crate::{
    query::{filter::like_pattern, FilterSet, PageRequest, Predicate},
    store::{RecordStore, UpsertOutcome},
};

const SELECT_RECORDS: &str = "SELECT source_id, external_id, city, is_available, price, \
     raw_data::text AS raw_data, created_at, updated_at FROM unified_records";

const COUNT_RECORDS: &str = "SELECT COUNT(*) FROM unified_records";

// xmax is 0 only for a freshly inserted row version
const UPSERT_RECORD: &str = r#"
    INSERT INTO unified_records (source_id, external_id, city, is_available, price, raw_data)
    VALUES ($1, $2, $3, $4, $5, CAST($6 AS JSON))
    ON CONFLICT (source_id, external_id) DO UPDATE SET
        city = EXCLUDED.city,
        is_available = EXCLUDED.is_available,
        price = EXCLUDED.price,
        raw_data = EXCLUDED.raw_data,
        updated_at = NOW()
    RETURNING (xmax = 0) AS inserted
"#;

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    source_id: String,
    external_id: Option<String>,
    city: Option<String>,
    is_available: Option<bool>,
    price: Option<f64>,
    raw_data: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for StoredRecord {
    type Error = UnidataError;

    fn try_from(row: RecordRow) -> Result<Self> {
        let raw_data: RawData = serde_json::from_str(&row.raw_data).map_err(|e| {
            UnidataError::persistence(format!("Stored raw_data is not a JSON object: {}", e))
        })?;

        Ok(StoredRecord {
            record: UnifiedRecord {
                source_id: row.source_id,
                id: row.external_id,
                city: row.city,
                is_available: row.is_available,
                price: row.price,
                raw_data,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(e: sqlx::Error) -> UnidataError {
    UnidataError::persistence(e.to_string())
}

/// Append a `WHERE` clause for `filters` (nothing when empty)
pub fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &FilterSet) {
    for (i, predicate) in filters.predicates().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        let column = predicate.field().column();

        match predicate {
            Predicate::Contains { needle, .. } => {
                builder
                    .push(column)
                    .push(" ILIKE ")
                    .push_bind(like_pattern(needle))
                    .push(" ESCAPE '\\'");
            },
            Predicate::Flag { value, .. } => {
                builder.push(column).push(" = ").push_bind(*value);
            },
            Predicate::Numeric { bounds, .. } => {
                let terms = [
                    (" = ", bounds.equals),
                    (" >= ", bounds.min),
                    (" <= ", bounds.max),
                ];
                builder.push("(");
                let mut first = true;
                for (op, value) in terms {
                    let Some(value) = value else { continue };
                    if !first {
                        builder.push(" AND ");
                    }
                    builder.push(column).push(op).push_bind(value);
                    first = false;
                }
                if first {
                    builder.push("TRUE");
                }
                builder.push(")");
            },
        }
    }
}

/// [`RecordStore`] over the `unified_records` table
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self, record), fields(source_id = %record.source_id, id = ?record.id))]
    async fn upsert(&self, record: &UnifiedRecord) -> Result<UpsertOutcome> {
        let raw_data = serde_json::to_string(&record.raw_data)?;

        let inserted: bool = sqlx::query_scalar(UPSERT_RECORD)
            .bind(&record.source_id)
            .bind(record.id.as_deref())
            .bind(record.city.as_deref())
            .bind(record.is_available)
            .bind(record.price)
            .bind(raw_data)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    #[instrument(skip(self))]
    async fn find(&self, filters: &FilterSet, page: &PageRequest) -> Result<Vec<StoredRecord>> {
        let mut builder = QueryBuilder::new(SELECT_RECORDS);
        push_filters(&mut builder, filters);
        builder
            .push(" ORDER BY seq LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<RecordRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(StoredRecord::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count(&self, filters: &FilterSet) -> Result<i64> {
        let mut builder = QueryBuilder::new(COUNT_RECORDS);
        push_filters(&mut builder, filters);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn health_check(&self) -> Result<()> {
        super::health_check(&self.pool)
            .await
            .map_err(|e| UnidataError::persistence(e.to_string()))
    }
}
