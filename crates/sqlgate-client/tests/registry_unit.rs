// crates/sqlgate-client/tests/registry_unit.rs
// ============================================================================
// Module: Schema Registry Unit Tests
// Description: Tests for catalog loading and atomic map installs.
// Purpose: Validate one-round-trip loads, degraded reads, and fail-closed
//          installs.
// Dependencies: sqlgate-client, sqlgate-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Exercises [`sqlgate_client::SchemaRegistry`] loading, degradation before
//! load, reload replacement, and malformed catalog handling.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;

use serde_json::json;
use sqlgate_client::ConnectionGateway;
use sqlgate_client::RegistryError;
use sqlgate_client::SCHEMA_QUERY;
use sqlgate_client::SchemaRegistry;
use sqlgate_core::SemanticType;

use common::Reply;
use common::ScriptedPool;
use common::catalog_row;
use common::row;
use common::users_catalog;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a registry over a fresh scripted pool.
fn scripted_registry() -> (Arc<ScriptedPool>, Arc<SchemaRegistry>) {
    let pool = Arc::new(ScriptedPool::new());
    let pool_handle: sqlgate_client::SharedPool = pool.clone();
    let gateway = Arc::new(ConnectionGateway::new(pool_handle));
    (pool, Arc::new(SchemaRegistry::new(gateway)))
}

// ============================================================================
// SECTION: Load Tests
// ============================================================================

/// Tests load issues the single catalog round trip.
#[tokio::test]
async fn load_issues_single_catalog_round_trip() {
    let (pool, registry) = scripted_registry();
    pool.push(Reply::Rows(users_catalog()));

    registry.load().await.expect("load");
    assert_eq!(pool.statements(), vec![SCHEMA_QUERY.to_string()]);
    assert!(registry.is_loaded());
}

/// Tests loaded descriptors carry normalized metadata.
#[tokio::test]
async fn loaded_descriptors_carry_normalized_metadata() {
    let (pool, registry) = scripted_registry();
    pool.push(Reply::Rows(users_catalog()));
    registry.load().await.expect("load");

    let fields = registry.fields("users");
    assert_eq!(fields.len(), 6);

    let id = fields.get("id").expect("id");
    assert!(id.primary);
    assert_eq!(id.semantic, SemanticType::Number);

    let name = fields.get("name").expect("name");
    assert_eq!(name.semantic, SemanticType::Text);
    assert_eq!(name.max_length, Some(64));
    assert!(!name.nullable);

    let active = fields.get("active").expect("active");
    assert_eq!(active.max_length, Some(3));
    assert!(active.nullable);
}

/// Tests tables lists every loaded table.
#[tokio::test]
async fn tables_lists_every_loaded_table() {
    let (pool, registry) = scripted_registry();
    let mut rows = users_catalog();
    rows.push(catalog_row("orders", "id", "bigint(20)", false, None, Some(20), "PRI"));
    pool.push(Reply::Rows(rows));
    registry.load().await.expect("load");

    assert_eq!(registry.tables(), vec!["orders".to_string(), "users".to_string()]);
}

// ============================================================================
// SECTION: Degradation Tests
// ============================================================================

/// Tests readers before load observe an empty field map.
#[test]
fn readers_before_load_observe_empty_field_map() {
    let (_pool, registry) = scripted_registry();
    assert!(!registry.is_loaded());
    assert!(registry.fields("users").is_empty());
    assert!(registry.tables().is_empty());
}

/// Tests unknown tables observe an empty field map after load.
#[tokio::test]
async fn unknown_tables_observe_empty_field_map() {
    let (pool, registry) = scripted_registry();
    pool.push(Reply::Rows(users_catalog()));
    registry.load().await.expect("load");

    assert!(registry.fields("missing").is_empty());
}

// ============================================================================
// SECTION: Failure Tests
// ============================================================================

/// Tests a failed load installs nothing.
#[tokio::test]
async fn failed_load_installs_nothing() {
    let (pool, registry) = scripted_registry();
    pool.push(Reply::Fail("catalog unavailable".to_string()));

    let error = registry.load().await.expect_err("error");
    assert!(matches!(error, RegistryError::Load(_)));
    assert!(!registry.is_loaded());
    assert!(registry.fields("users").is_empty());
}

/// Tests a failed reload keeps the previous map.
#[tokio::test]
async fn failed_reload_keeps_previous_map() {
    let (pool, registry) = scripted_registry();
    pool.push(Reply::Rows(users_catalog()));
    registry.load().await.expect("load");

    pool.push(Reply::Fail("catalog unavailable".to_string()));
    registry.load().await.expect_err("error");

    assert!(registry.is_loaded());
    assert_eq!(registry.fields("users").len(), 6);
}

/// Tests malformed catalog rows are rejected as shape errors.
#[tokio::test]
async fn malformed_catalog_rows_rejected_as_shape_errors() {
    let (pool, registry) = scripted_registry();
    pool.push(Reply::Rows(vec![row(&["table_name"], vec![json!(42)])]));

    let error = registry.load().await.expect_err("error");
    assert!(matches!(error, RegistryError::Shape(_)));
    assert!(!registry.is_loaded());
}

// ============================================================================
// SECTION: Reload Tests
// ============================================================================

/// Tests a successful reload replaces the map wholesale.
#[tokio::test]
async fn successful_reload_replaces_map_wholesale() {
    let (pool, registry) = scripted_registry();
    pool.push(Reply::Rows(users_catalog()));
    registry.load().await.expect("load");

    pool.push(Reply::Rows(vec![catalog_row(
        "orders",
        "id",
        "bigint(20)",
        false,
        None,
        Some(20),
        "PRI",
    )]));
    registry.load().await.expect("reload");

    assert!(registry.fields("users").is_empty());
    assert_eq!(registry.fields("orders").len(), 1);
}
