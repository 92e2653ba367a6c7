// crates/sqlgate-client/src/registry.rs
// ============================================================================
// Module: Sqlgate Schema Registry
// Description: Cached per-table column metadata loaded from the catalog.
// Purpose: Load the whole database schema in one round trip and serve
//          immutable field maps to entities.
// Dependencies: sqlgate-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The registry loads column metadata for every table in the current
//! database with a single catalog query, normalizes it into field
//! descriptors, and installs the finished map atomically. Readers before
//! the first successful load observe an empty field map; validation and
//! planning against an empty map degrade to "unknown field" reports rather
//! than crashing. A failed load installs nothing; no partial or stale map
//! is ever visible.
//! Invariants:
//! - Single writer, many readers; readers never observe a half-built map.
//! - `load` doubles as refresh: replacement is wholesale and atomic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde_json::Value;
use sqlgate_core::FieldDescriptor;
use sqlgate_core::FieldMap;
use thiserror::Error;

use crate::driver::Row;
use crate::gateway::ConnectionGateway;
use crate::gateway::GatewayError;

// ============================================================================
// SECTION: Catalog Query
// ============================================================================

/// One-round-trip catalog query covering every table in the database.
pub const SCHEMA_QUERY: &str = "SELECT table_name, column_name, column_type, is_nullable, \
                                character_maximum_length, numeric_precision, column_key, \
                                column_default FROM information_schema.columns \
                                WHERE table_schema = DATABASE() \
                                ORDER BY table_name, ordinal_position";

// ============================================================================
// SECTION: Registry Errors
// ============================================================================

/// Errors raised while loading the schema.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - A load failure leaves the previously installed map untouched.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The catalog query failed.
    #[error("schema load failed: {0}")]
    Load(#[source] GatewayError),
    /// A catalog row was missing an expected column.
    #[error("catalog row malformed: {0}")]
    Shape(String),
    /// The registry lock was poisoned by a panicked writer.
    #[error("schema registry lock poisoned")]
    Poisoned,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Shared field map for one table.
pub type SharedFieldMap = Arc<FieldMap>;

/// Fully-built schema installed by a successful load.
type LoadedSchema = BTreeMap<String, SharedFieldMap>;

/// Cached per-table column metadata with single-writer installs.
pub struct SchemaRegistry {
    /// Gateway used for catalog queries.
    gateway: Arc<ConnectionGateway>,
    /// Installed schema; `None` until the first successful load.
    state: RwLock<Option<Arc<LoadedSchema>>>,
}

impl SchemaRegistry {
    /// Creates an unloaded registry over the provided gateway.
    #[must_use]
    pub fn new(gateway: Arc<ConnectionGateway>) -> Self {
        Self { gateway, state: RwLock::new(None) }
    }

    /// Loads (or reloads) column metadata for every table in one round
    /// trip and installs the finished map atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the catalog query fails or a catalog
    /// row is malformed; the previously installed map stays in place.
    pub async fn load(&self) -> Result<(), RegistryError> {
        let rows = self
            .gateway
            .fetch_all(SCHEMA_QUERY, &[])
            .await
            .map_err(RegistryError::Load)?;
        let schema = build_schema(rows)?;
        let mut guard = self.state.write().map_err(|_| RegistryError::Poisoned)?;
        *guard = Some(Arc::new(schema));
        Ok(())
    }

    /// Reports whether a load has completed successfully.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the cached field map for a table.
    ///
    /// Yields an empty map when the registry has not loaded yet or the
    /// table is unknown; callers degrade to "unknown field" behavior.
    #[must_use]
    pub fn fields(&self, table: &str) -> SharedFieldMap {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .and_then(|schema| schema.get(table).cloned())
            .unwrap_or_default()
    }

    /// Returns the names of all loaded tables.
    #[must_use]
    pub fn tables(&self) -> Vec<String> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(|schema| schema.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// SECTION: Catalog Normalization
// ============================================================================

/// Builds the schema map from catalog rows ordered by table and position.
fn build_schema(rows: Vec<Row>) -> Result<LoadedSchema, RegistryError> {
    let mut building: BTreeMap<String, FieldMap> = BTreeMap::new();
    for row in rows {
        let table = require_text(&row, "table_name")?;
        let column = require_text(&row, "column_name")?;
        let column_type = require_text(&row, "column_type")?;
        let nullable = require_text(&row, "is_nullable")? == "YES";
        let char_max_length = optional_unsigned(&row, "character_maximum_length");
        let numeric_precision = optional_unsigned(&row, "numeric_precision");
        let column_key = optional_text(&row, "column_key");
        let default_value = match row.get("column_default") {
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        };
        let descriptor = FieldDescriptor::from_catalog(
            column.clone(),
            &column_type,
            nullable,
            char_max_length,
            numeric_precision,
            &column_key,
            default_value,
        );
        building.entry(table).or_default().insert(column, descriptor);
    }
    Ok(building
        .into_iter()
        .map(|(table, fields)| (table, Arc::new(fields)))
        .collect())
}

/// Reads a required textual catalog column.
fn require_text(row: &Row, column: &str) -> Result<String, RegistryError> {
    match row.get(column) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(RegistryError::Shape(format!(
            "column {column} must be text, got {other}"
        ))),
        None => Err(RegistryError::Shape(format!("column {column} missing"))),
    }
}

/// Reads an optional textual catalog column, defaulting empty.
fn optional_text(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    }
}

/// Reads an optional unsigned catalog column.
fn optional_unsigned(row: &Row, column: &str) -> Option<u64> {
    row.get(column).and_then(Value::as_u64)
}
