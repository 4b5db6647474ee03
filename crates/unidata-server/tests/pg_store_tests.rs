//! Postgres record store tests
//!
//! Skipped unless `TEST_DATABASE_URL` points at a PostgreSQL 15+ database:
//!
//! ```bash
//! TEST_DATABASE_URL=postgresql://localhost/unidata_test cargo test --test pg_store_tests
//! ```

#![allow(clippy::unwrap_used)]

use serde_json::json;
use std::collections::BTreeMap;
use unidata_common::types::{RawData, UnifiedRecord};
use unidata_server::{
    config::Config,
    db::{self, PgRecordStore},
    query::{build_query, PageRequest},
    store::{RecordStore, UpsertOutcome},
};
use uuid::Uuid;

async fn setup_store() -> Option<PgRecordStore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let mut config = Config::default().database;
    config.url = url;

    let pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to connect to test database: {}", e);
            return None;
        },
    };
    db::run_migrations(&pool).await.unwrap();
    Some(PgRecordStore::new(pool))
}

/// A source id no other test run shares
fn unique_source() -> String {
    format!("test-{}", Uuid::new_v4())
}

fn record(source_id: &str, id: Option<&str>, city: &str, price: f64) -> UnifiedRecord {
    let raw = json!({"id": id, "city": city, "zeta": 1, "alpha": 2});
    let mut record = UnifiedRecord::new(source_id, RawData::new(raw.as_object().unwrap().clone()));
    record.id = id.map(str::to_string);
    record.city = Some(city.to_string());
    record.price = Some(price);
    record
}

fn source_filter(source_id: &str, extra: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut params = BTreeMap::from([("sourceId".to_string(), source_id.to_string())]);
    for (k, v) in extra {
        params.insert(k.to_string(), v.to_string());
    }
    params
}

#[tokio::test]
async fn test_upsert_inserts_then_updates() {
    let Some(store) = setup_store().await else {
        return;
    };
    let source = unique_source();

    let first = record(&source, Some("a1"), "Paris", 100.0);
    assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Inserted);

    let second = record(&source, Some("a1"), "Lyon", 90.0);
    assert_eq!(store.upsert(&second).await.unwrap(), UpsertOutcome::Updated);

    let filters = build_query(&source_filter(&source, &[])).unwrap();
    let found = store.find(&filters, &PageRequest::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].record.city.as_deref(), Some("Lyon"));
    assert!(found[0].updated_at >= found[0].created_at);
}

#[tokio::test]
async fn test_records_without_id_share_one_slot() {
    let Some(store) = setup_store().await else {
        return;
    };
    let source = unique_source();

    store.upsert(&record(&source, None, "Paris", 1.0)).await.unwrap();
    let outcome = store.upsert(&record(&source, None, "Rome", 2.0)).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);

    let filters = build_query(&source_filter(&source, &[])).unwrap();
    assert_eq!(store.count(&filters).await.unwrap(), 1);
}

#[tokio::test]
async fn test_raw_data_key_order_survives() {
    let Some(store) = setup_store().await else {
        return;
    };
    let source = unique_source();
    store.upsert(&record(&source, Some("a1"), "Paris", 1.0)).await.unwrap();

    let filters = build_query(&source_filter(&source, &[])).unwrap();
    let found = store.find(&filters, &PageRequest::default()).await.unwrap();
    let keys: Vec<_> = found[0].record.raw_data.as_map().keys().cloned().collect();
    assert_eq!(keys, vec!["id", "city", "zeta", "alpha"]);
}

#[tokio::test]
async fn test_filters_and_pagination() {
    let Some(store) = setup_store().await else {
        return;
    };
    let source = unique_source();
    for (i, (city, price)) in [("Paris", 50.0), ("London", 100.0), ("Parma", 150.0)]
        .into_iter()
        .enumerate()
    {
        store
            .upsert(&record(&source, Some(&format!("r{i}")), city, price))
            .await
            .unwrap();
    }

    let range = build_query(&source_filter(&source, &[("price_min", "60"), ("price_max", "120")]))
        .unwrap();
    let found = store.find(&range, &PageRequest::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].record.city.as_deref(), Some("London"));

    let city = build_query(&source_filter(&source, &[("city", "PAR")])).unwrap();
    assert_eq!(store.count(&city).await.unwrap(), 2);

    let all = build_query(&source_filter(&source, &[])).unwrap();
    let page = store.find(&all, &PageRequest::new(2, 2).unwrap()).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].record.id.as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_like_wildcards_are_literal() {
    let Some(store) = setup_store().await else {
        return;
    };
    let source = unique_source();
    store.upsert(&record(&source, Some("a1"), "Paris", 1.0)).await.unwrap();
    store.upsert(&record(&source, Some("a2"), "100%_city", 1.0)).await.unwrap();

    let filters = build_query(&source_filter(&source, &[("city", "%")])).unwrap();
    let found = store.find(&filters, &PageRequest::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].record.id.as_deref(), Some("a2"));
}

#[tokio::test]
async fn test_health_check() {
    let Some(store) = setup_store().await else {
        return;
    };
    assert!(store.health_check().await.is_ok());
}
