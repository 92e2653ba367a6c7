// crates/sqlgate-client/src/entity.rs
// ============================================================================
// Module: Sqlgate Entity Operations
// Description: Application-facing CRUD binding between a type and one table.
// Purpose: Compose plans from registry state and execute them through the
//          gateway, including save orchestration and timestamp policy.
// Dependencies: sqlgate-core, serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! An entity binds application code to one table: it reads the cached field
//! map from the registry, plans SQL in core, and executes through the
//! gateway. Entities hold no mutable state beyond configuration; the
//! schema stays owned by the registry, and a registry that has not loaded
//! yet degrades every check to "unknown field" instead of crashing.
//! Invariants:
//! - `save` stamps the update column on every update and suppresses any
//!   caller-supplied creation stamp on updates; creation time is only ever
//!   set on insert.
//! - Upsert results stay ambiguous: both raw driver signals are returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use sqlgate_core::Record;
use sqlgate_core::SelectOptions;
use sqlgate_core::ValidationReport;
use sqlgate_core::plan;
use sqlgate_core::plan::PlanError;
use sqlgate_core::schema::primary_key_column;
use sqlgate_core::stamp::render_stamp;
use sqlgate_core::validate;
use thiserror::Error;
use time::OffsetDateTime;

use crate::driver::ExecuteOutcome;
use crate::driver::Row;
use crate::gateway::ConnectionGateway;
use crate::gateway::GatewayError;
use crate::registry::SchemaRegistry;
use crate::stream::ConsumerError;
use crate::stream::StreamError;
use crate::stream::StreamSummary;
use crate::stream::stream_each;

// ============================================================================
// SECTION: Clock Seam
// ============================================================================

/// Supplies the wall-clock stamps used by save orchestration.
///
/// Injected so entity behavior stays deterministic under test; the core
/// crates never read wall-clock time themselves.
pub trait Clock: Send + Sync {
    /// Returns the current moment in column stamp format.
    fn now_stamp(&self) -> String;
}

/// Wall-clock implementation used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_stamp(&self) -> String {
        render_stamp(OffsetDateTime::now_utc())
    }
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Per-entity configuration.
///
/// # Invariants
/// - Column names must be non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityOptions {
    /// Primary key column used when the schema defines none.
    #[serde(default = "default_primary_key_fallback")]
    pub primary_key_fallback: String,
    /// Creation timestamp column, stamped only on insert.
    #[serde(default = "default_created_column")]
    pub created_column: String,
    /// Update timestamp column, stamped on every save-update.
    #[serde(default = "default_updated_column")]
    pub updated_column: String,
    /// Whether save orchestration stamps timestamp columns at all.
    #[serde(default = "default_stamp_timestamps")]
    pub stamp_timestamps: bool,
}

impl Default for EntityOptions {
    fn default() -> Self {
        Self {
            primary_key_fallback: default_primary_key_fallback(),
            created_column: default_created_column(),
            updated_column: default_updated_column(),
            stamp_timestamps: default_stamp_timestamps(),
        }
    }
}

/// Returns the default primary key fallback column.
fn default_primary_key_fallback() -> String {
    "id".to_string()
}

/// Returns the default creation timestamp column.
fn default_created_column() -> String {
    "created_at".to_string()
}

/// Returns the default update timestamp column.
fn default_updated_column() -> String {
    "updated_at".to_string()
}

/// Returns the default stamping policy.
const fn default_stamp_timestamps() -> bool {
    true
}

/// Validates entity options.
fn validate_options(options: &EntityOptions) -> Result<(), EntityError> {
    if options.primary_key_fallback.is_empty() {
        return Err(EntityError::InvalidOptions(
            "primary_key_fallback must not be empty".to_string(),
        ));
    }
    if options.created_column.is_empty() || options.updated_column.is_empty() {
        return Err(EntityError::InvalidOptions(
            "timestamp column names must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Entity Errors
// ============================================================================

/// Errors returned by entity operations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum EntityError {
    /// A precondition failed before any I/O.
    #[error("query planning failed: {0}")]
    Plan(#[from] PlanError),
    /// Execution failed at the gateway.
    #[error("query execution failed: {0}")]
    Gateway(#[from] GatewayError),
    /// Streaming failed.
    #[error("streaming failed: {0}")]
    Stream(#[from] StreamError),
    /// Entity options were rejected.
    #[error("invalid entity options: {0}")]
    InvalidOptions(String),
}

// ============================================================================
// SECTION: Entity
// ============================================================================

/// Application-facing binding between one table and its operations.
pub struct Entity {
    /// Bound table name.
    table: String,
    /// Registry serving the cached field map.
    registry: Arc<SchemaRegistry>,
    /// Gateway executing the plans.
    gateway: Arc<ConnectionGateway>,
    /// Per-entity configuration.
    options: EntityOptions,
    /// Stamp source for save orchestration.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("table", &self.table)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Entity {
    /// Creates an entity with default options and the system clock.
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        registry: Arc<SchemaRegistry>,
        gateway: Arc<ConnectionGateway>,
    ) -> Self {
        Self {
            table: table.into(),
            registry,
            gateway,
            options: EntityOptions::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates an entity with explicit options and clock.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::InvalidOptions`] when option validation fails.
    pub fn with_options(
        table: impl Into<String>,
        registry: Arc<SchemaRegistry>,
        gateway: Arc<ConnectionGateway>,
        options: EntityOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EntityError> {
        validate_options(&options)?;
        Ok(Self { table: table.into(), registry, gateway, options, clock })
    }

    /// Returns the bound table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolves the primary key column from the cached field map.
    #[must_use]
    pub fn primary_key(&self) -> String {
        primary_key_column(&self.registry.fields(&self.table), &self.options.primary_key_fallback)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Returns the first record matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when execution fails.
    pub async fn find_one(&self, filter: &Record) -> Result<Option<Record>, EntityError> {
        let options = SelectOptions { limit: Some(1), ..SelectOptions::default() };
        let built = plan::select(&self.table, filter, &options);
        let mut rows = self.gateway.fetch_all(&built.sql, &built.params).await?;
        Ok(rows.pop().map(Row::into_record))
    }

    /// Returns every record matching the filter, honoring paging options.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when execution fails.
    pub async fn find_all(
        &self,
        filter: &Record,
        options: &SelectOptions,
    ) -> Result<Vec<Record>, EntityError> {
        let built = plan::select(&self.table, filter, options);
        let rows = self.gateway.fetch_all(&built.sql, &built.params).await?;
        Ok(rows.into_iter().map(Row::into_record).collect())
    }

    /// Returns one column's values for every record matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when execution fails.
    pub async fn find_all_column(
        &self,
        column: &str,
        filter: &Record,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Value>, EntityError> {
        let options = SelectOptions { column: Some(column.to_string()), limit, offset };
        let built = plan::select(&self.table, filter, &options);
        let rows = self.gateway.fetch_all(&built.sql, &built.params).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.value_at(0).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Counts the records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when execution fails.
    pub async fn count(&self, filter: &Record) -> Result<u64, EntityError> {
        let built = plan::count(&self.table, filter);
        let rows = self.gateway.fetch_all(&built.sql, &built.params).await?;
        Ok(rows
            .first()
            .and_then(|row| row.value_at(0))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validates a record against the cached field map.
    ///
    /// Before the registry has loaded, every field reports as unknown.
    /// That is the documented degraded mode, not an error.
    #[must_use]
    pub fn validate(&self, record: &Record) -> Option<ValidationReport> {
        validate(&self.registry.fields(&self.table), record)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Inserts a record and returns the assigned identifier, when any.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] on empty records or execution failure.
    pub async fn insert(
        &self,
        record: &Record,
        ignore_duplicates: bool,
    ) -> Result<Option<u64>, EntityError> {
        let built = plan::insert(&self.table, record, ignore_duplicates)?;
        let outcome = self.gateway.execute(&built.sql, &built.params).await?;
        Ok(outcome.last_insert_id)
    }

    /// Updates a record scoped by its primary key value.
    ///
    /// Returns the count of rows whose stored values actually changed; a
    /// row matched by key but identical in content counts zero.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when the record lacks an identifier or
    /// execution fails.
    pub async fn update(&self, record: &Record) -> Result<u64, EntityError> {
        let built = plan::update(&self.table, &self.primary_key(), record)?;
        let outcome = self.gateway.execute(&built.sql, &built.params).await?;
        Ok(outcome.affected_rows)
    }

    /// Inserts or updates on duplicate key, returning both raw signals.
    ///
    /// The outcome is ambiguous by contract: compare `last_insert_id`
    /// against `affected_rows` to distinguish insert from update, and note
    /// that a write identical to the existing row is indistinguishable from
    /// "nothing happened".
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] on empty records or execution failure.
    pub async fn insert_or_update(&self, record: &Record) -> Result<ExecuteOutcome, EntityError> {
        let built = plan::upsert(&self.table, record, &[self.options.created_column.as_str()])?;
        Ok(self.gateway.execute(&built.sql, &built.params).await?)
    }

    /// Deletes the record with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when execution fails.
    pub async fn delete_by_id(&self, id: Value) -> Result<u64, EntityError> {
        let built = plan::delete(&self.table, &self.primary_key(), id);
        let outcome = self.gateway.execute(&built.sql, &built.params).await?;
        Ok(outcome.affected_rows)
    }

    /// Inserts or updates based on the record's primary key value.
    ///
    /// A record carrying a key value takes the update path: the update
    /// column is stamped (when the schema defines it and stamping is on),
    /// any caller-supplied creation stamp is suppressed, and the incoming
    /// identifier is returned. Otherwise the insert path stamps the
    /// creation column only when the caller did not supply one and returns
    /// the newly assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] on planning or execution failure.
    pub async fn save(&self, record: &Record) -> Result<Option<Value>, EntityError> {
        let fields = self.registry.fields(&self.table);
        let pk_column = primary_key_column(&fields, &self.options.primary_key_fallback);
        let mut working = record.clone();
        let id = working.get(&pk_column).filter(|value| !value.is_null()).cloned();
        if let Some(id) = id {
            if self.options.stamp_timestamps && fields.contains_key(&self.options.updated_column) {
                working.insert(
                    self.options.updated_column.clone(),
                    Value::String(self.clock.now_stamp()),
                );
            }
            working.remove(&self.options.created_column);
            let built = plan::update(&self.table, &pk_column, &working)?;
            self.gateway.execute(&built.sql, &built.params).await?;
            Ok(Some(id))
        } else {
            working.remove(&pk_column);
            if self.options.stamp_timestamps
                && fields.contains_key(&self.options.created_column)
                && !working.contains_key(&self.options.created_column)
            {
                working.insert(
                    self.options.created_column.clone(),
                    Value::String(self.clock.now_stamp()),
                );
            }
            let built = plan::insert(&self.table, &working, false)?;
            let outcome = self.gateway.execute(&built.sql, &built.params).await?;
            Ok(outcome.last_insert_id.map(|id| Value::Number(id.into())))
        }
    }

    // ------------------------------------------------------------------
    // Streaming
    // ------------------------------------------------------------------

    /// Streams every record matching the filter through an acknowledging
    /// consumer, one row at a time.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] on acquisition, read, or consumer failure;
    /// the connection is released first.
    pub async fn stream<F, Fut>(
        &self,
        filter: &Record,
        read_buffer_rows: usize,
        consumer: F,
    ) -> Result<StreamSummary, EntityError>
    where
        F: FnMut(Row) -> Fut + Send,
        Fut: Future<Output = Result<(), ConsumerError>> + Send,
    {
        let built = plan::select(&self.table, filter, &SelectOptions::default());
        Ok(stream_each(&self.gateway, &built.sql, &built.params, read_buffer_rows, consumer).await?)
    }
}
