// crates/sqlgate-client/src/driver.rs
// ============================================================================
// Module: Sqlgate Driver Interfaces
// Description: Backend-agnostic connection, streaming, and sink seams.
// Purpose: Define the contract surfaces the data-access layer executes
//          against without embedding driver-specific details.
// Dependencies: sqlgate-core, async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The physical connection pool and wire protocol are external
//! collaborators. This module defines the seams they plug into: acquire a
//! connection, execute a parameterized statement, pull rows one at a time,
//! and release the connection. Implementations must honor the strict pull
//! contract (a [`RowSource`] produces the next row only when asked) and
//! must expand array-valued bound parameters positionally for `IN (?)`
//! placeholders.
//! Invariants:
//! - `release` is infallible and called exactly once per acquired
//!   connection by the gateway and streaming executor.
//! - Row column order matches the statement's projection order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlgate_core::Record;
use thiserror::Error;

// ============================================================================
// SECTION: Driver Errors
// ============================================================================

/// Errors surfaced by driver implementations.
///
/// # Invariants
/// - Variants are stable for programmatic handling; causes travel as text.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Connection acquisition failed.
    #[error("driver connect failure: {0}")]
    Connect(String),
    /// Statement execution failed.
    #[error("driver execute failure: {0}")]
    Execute(String),
    /// Row streaming failed.
    #[error("driver stream failure: {0}")]
    Stream(String),
}

/// Errors emitted by row sinks.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The downstream consumer is gone.
    #[error("sink closed by downstream")]
    Closed,
    /// The downstream write failed.
    #[error("sink write failed: {0}")]
    Write(String),
}

// ============================================================================
// SECTION: Result Types
// ============================================================================

/// Outcome of a single executed statement.
///
/// # Invariants
/// - For UPDATE statements `affected_rows` counts rows whose stored values
///   actually changed, not merely matched rows.
/// - `last_insert_id` is present only when the driver assigned one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOutcome {
    /// Rows changed by the statement.
    pub affected_rows: u64,
    /// Identifier assigned by an insert, when any.
    pub last_insert_id: Option<u64>,
}

/// One result row in projection order.
///
/// # Invariants
/// - `values` holds exactly one entry per column, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Shared projection column names.
    columns: Arc<[String]>,
    /// Values in column order.
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from shared column names and ordered values.
    #[must_use]
    pub const fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Returns the projection column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Returns the value stored under a column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.values.get(index)
    }

    /// Returns the value at a projection position.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Converts the row into a record keyed by column name.
    #[must_use]
    pub fn into_record(self) -> Record {
        let Self { columns, values } = self;
        columns.iter().cloned().zip(values).collect()
    }
}

// ============================================================================
// SECTION: Connection Seams
// ============================================================================

/// Acquires connections from the underlying pool.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Acquires a connection, waiting for pool capacity if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when no connection can be provided.
    async fn acquire(&self) -> Result<Box<dyn Connection>, DriverError>;
}

/// Shared handle to a connection pool.
pub type SharedPool = Arc<dyn ConnectionPool>;

/// One acquired database connection.
#[async_trait]
pub trait Connection: Send {
    /// Executes a parameterized statement and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when execution fails.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecuteOutcome, DriverError>;

    /// Executes a parameterized query and buffers the full result set.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when execution fails.
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;

    /// Opens a streamed query; `read_buffer_rows` is a transport read-buffer
    /// hint and never changes delivery semantics.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when the statement cannot be dispatched.
    async fn open_stream<'conn>(
        &'conn mut self,
        sql: &str,
        params: &[Value],
        read_buffer_rows: usize,
    ) -> Result<Box<dyn RowSource + Send + 'conn>, DriverError>;

    /// Returns the connection to the pool. Infallible by contract; drivers
    /// absorb close failures.
    async fn release(self: Box<Self>);
}

/// Pull-based row stream over one dispatched query.
#[async_trait]
pub trait RowSource: Send {
    /// Pulls the next row, or `None` at end of results.
    ///
    /// The next row is not produced until this method is called again; the
    /// caller's pace is the backpressure signal.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when the stream fails mid-flight.
    async fn next_row(&mut self) -> Result<Option<Row>, DriverError>;
}

// ============================================================================
// SECTION: Sink Seam
// ============================================================================

/// Backpressure-capable downstream destination for streamed rows.
#[async_trait]
pub trait RowSink: Send {
    /// Accepts one row; the returned future completing is the downstream's
    /// native flow-control signal.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the downstream rejects the row.
    async fn accept(&mut self, row: Row) -> Result<(), SinkError>;

    /// Flushes and finalizes the downstream after end of results.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when finalization fails.
    async fn complete(&mut self) -> Result<(), SinkError>;
}
