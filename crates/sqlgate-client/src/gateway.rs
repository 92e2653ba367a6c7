// crates/sqlgate-client/src/gateway.rs
// ============================================================================
// Module: Sqlgate Connection Gateway
// Description: Acquire-execute-release wrapper over the driver pool.
// Purpose: Guarantee connection release on every exit path and account
//          for traffic.
// Dependencies: sqlgate-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The gateway is the single choke point between the data-access layer and
//! the driver pool: every statement acquires a connection, executes, and
//! releases the connection whether execution succeeded or failed.
//! Invariants:
//! - A connection acquired here is released exactly once on every exit
//!   path; the stats counters make the pairing observable.
//! - No retry is performed at this layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use sqlgate_core::record::render_text;
use thiserror::Error;

use crate::driver::Connection;
use crate::driver::DriverError;
use crate::driver::ExecuteOutcome;
use crate::driver::Row;
use crate::driver::SharedPool;
use crate::stats::GatewayStats;
use crate::stats::GatewayStatsSnapshot;

// ============================================================================
// SECTION: Gateway Errors
// ============================================================================

/// Errors returned by gateway operations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - The driver cause is preserved, never swallowed.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection acquisition failed.
    #[error("connection acquire failed: {0}")]
    Acquire(#[source] DriverError),
    /// Statement execution failed after a connection was acquired.
    #[error("statement execution failed: {0}")]
    Execute(#[source] DriverError),
    /// A pairs reduction met a row that is not exactly two columns wide.
    #[error("pairs query must return exactly two columns, got {columns}")]
    PairsShape {
        /// Column count of the offending row.
        columns: usize,
    },
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Acquire-execute-release wrapper over the driver pool.
pub struct ConnectionGateway {
    /// Underlying driver pool.
    pool: SharedPool,
    /// Traffic counters.
    stats: GatewayStats,
}

impl ConnectionGateway {
    /// Creates a gateway over the provided pool.
    #[must_use]
    pub fn new(pool: SharedPool) -> Self {
        Self { pool, stats: GatewayStats::default() }
    }

    /// Returns a point-in-time view of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    /// Acquires a connection and records the acquisition.
    pub(crate) async fn acquire(&self) -> Result<Box<dyn Connection>, GatewayError> {
        let connection = self.pool.acquire().await.map_err(GatewayError::Acquire)?;
        self.stats.record_acquired();
        Ok(connection)
    }

    /// Releases a connection and records the release.
    pub(crate) async fn release(&self, connection: Box<dyn Connection>) {
        connection.release().await;
        self.stats.record_released();
    }

    /// Records one row delivered through a stream.
    pub(crate) fn record_row_streamed(&self) {
        self.stats.record_row_streamed();
    }

    /// Executes a parameterized statement on a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when acquisition or execution fails; the
    /// connection is released in either case.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteOutcome, GatewayError> {
        let mut connection = self.acquire().await?;
        let executed = connection.execute(sql, params).await.map_err(GatewayError::Execute);
        self.release(connection).await;
        let outcome = executed?;
        self.stats.record_executed();
        Ok(outcome)
    }

    /// Executes a parameterized query and buffers the full result set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when acquisition or execution fails; the
    /// connection is released in either case.
    pub async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, GatewayError> {
        let mut connection = self.acquire().await?;
        let queried = connection.query(sql, params).await.map_err(GatewayError::Execute);
        self.release(connection).await;
        let rows = queried?;
        self.stats.record_executed();
        self.stats.record_rows_fetched(u64::try_from(rows.len()).unwrap_or(u64::MAX));
        Ok(rows)
    }

    /// Executes a two-column query and reduces it into a key/value mapping.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PairsShape`] when any row is not exactly two
    /// columns wide, besides ordinary execution failures.
    pub async fn fetch_pairs(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<BTreeMap<String, Value>, GatewayError> {
        let rows = self.fetch_all(sql, params).await?;
        rows_to_pairs(rows)
    }
}

// ============================================================================
// SECTION: Pairs Reduction
// ============================================================================

/// Reduces a two-column result set into a key/value mapping.
///
/// Keys are the textual rendering of the first column. Rows of any other
/// width are rejected, never truncated.
///
/// # Errors
///
/// Returns [`GatewayError::PairsShape`] naming the offending width.
pub fn rows_to_pairs(rows: Vec<Row>) -> Result<BTreeMap<String, Value>, GatewayError> {
    let mut pairs = BTreeMap::new();
    for row in rows {
        if row.width() != 2 {
            return Err(GatewayError::PairsShape { columns: row.width() });
        }
        let key = row.value_at(0).map(render_text).unwrap_or_default();
        let value = row.value_at(1).cloned().unwrap_or(Value::Null);
        pairs.insert(key, value);
    }
    Ok(pairs)
}
