// Integration tests for key listing, raw and structured filters

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::open_store;
use docstore_store::{DocStoreError, DocumentStore, KeyFilter};
use serde_json::{json, Value};
use tempfile::TempDir;

async fn seeded_store() -> (TempDir, DocumentStore) {
    let (dir, store) = open_store();
    let docs = [
        ("user:1", json!({"status": "active", "age": 31})),
        ("user:2", json!({"status": "banned", "age": 45})),
        ("admin:1", json!({"status": "active", "age": 52})),
        ("user:3", json!({"status": "active", "age": 19})),
    ];
    for (key, value) in docs.iter() {
        store.write("accounts", key, value).await.unwrap();
    }
    (dir, store)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_keys_on_fresh_collection_is_empty() {
    // Given: A collection never written to
    let (_dir, store) = open_store();

    // When: We list its keys
    let keys = store.list_keys("empty").await.unwrap();

    // Then: The result is empty, and the table now exists
    assert!(keys.is_empty());
    assert!(store.registry().is_verified("empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_keys_returns_every_key() {
    // Given: Four documents
    let (_dir, store) = seeded_store().await;

    // When: We list keys
    let keys = store.list_keys("accounts").await.unwrap();

    // Then: All four come back in insertion order
    assert_eq!(keys, vec!["user:1", "user:2", "admin:1", "user:3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_condition_is_applied_verbatim() {
    // Given: Four documents
    let (_dir, store) = seeded_store().await;

    // When: We filter with a raw SQL condition on the payload
    let mut keys = store
        .list_keys_where_sql("accounts", "json_extract(j, '$.age') > 30")
        .await
        .unwrap();
    keys.sort();

    // Then: Only matching keys are returned
    assert_eq!(keys, vec!["admin:1", "user:1", "user:2"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_condition_is_not_sanitized() {
    // Given: Four documents
    let (_dir, store) = seeded_store().await;

    // When: The condition carries an injected tautology
    let keys = store
        .list_keys_where_sql("accounts", "id = 'nobody' OR 1=1")
        .await
        .unwrap();

    // Then: It is honored as written
    assert_eq!(keys.len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_raw_condition_is_backend_error() {
    // Given: A store
    let (_dir, store) = seeded_store().await;

    // When: The condition is not valid SQL
    let err = store
        .list_keys_where_sql("accounts", "age >>> ")
        .await
        .unwrap_err();

    // Then: The backend rejection is returned
    assert!(matches!(err, DocStoreError::Backend { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_prefix_filter_binds_its_value() {
    // Given: Four documents
    let (_dir, store) = seeded_store().await;

    // When: We filter by key prefix
    let users = store
        .list_keys_filtered("accounts", &KeyFilter::key_prefix("user:"))
        .await
        .unwrap();
    let injected = store
        .list_keys_filtered("accounts", &KeyFilter::key_prefix("x' OR '1'='1"))
        .await
        .unwrap();

    // Then: Prefixes match literally
    assert_eq!(users, vec!["user:1", "user:2", "user:3"]);
    assert!(injected.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_equals_filter_matches_scalar_fields() {
    // Given: Four documents
    let (_dir, store) = seeded_store().await;

    // When: We filter by a string field and by a number field
    let active = store
        .list_keys_filtered("accounts", &KeyFilter::json_equals("$.status", "active"))
        .await
        .unwrap();
    let aged = store
        .list_keys_filtered("accounts", &KeyFilter::json_equals("$.age", 45))
        .await
        .unwrap();

    // Then: Only documents with that exact value match
    assert_eq!(active, vec!["user:1", "admin:1", "user:3"]);
    assert_eq!(aged, vec!["user:2"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_equals_null_matches_explicit_null_only() {
    // Given: One document with a null field, one without the field
    let (_dir, store) = open_store();
    store
        .write("staff", "s1", &json!({"manager": null}))
        .await
        .unwrap();
    store
        .write("staff", "s2", &json!({"name": "ada"}))
        .await
        .unwrap();
    store
        .write("staff", "s3", &json!({"manager": "s1"}))
        .await
        .unwrap();

    // When: We filter on a null value
    let keys = store
        .list_keys_filtered("staff", &KeyFilter::json_equals("$.manager", Value::Null))
        .await
        .unwrap();

    // Then: Only the explicit null matches
    assert_eq!(keys, vec!["s1"]);
}
