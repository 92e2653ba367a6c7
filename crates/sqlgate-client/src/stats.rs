// crates/sqlgate-client/src/stats.rs
// ============================================================================
// Module: Sqlgate Gateway Stats
// Description: Lightweight connection and row accounting counters.
// Purpose: Observe gateway traffic without a metrics framework dependency.
// Dependencies: serde, std
// ============================================================================

//! ## Overview
//! Dependency-light counters for gateway activity. Snapshots are plain
//! serializable values so downstream deployments can plug them into any
//! metrics pipeline without redesign. The acquired/released pair doubles as
//! the observable form of the release-on-every-exit-path invariant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Serialize;

// ============================================================================
// SECTION: Counters
// ============================================================================

/// Atomic counters tracking gateway traffic.
#[derive(Debug, Default)]
pub struct GatewayStats {
    /// Connections handed out by the pool.
    acquired: AtomicU64,
    /// Connections returned to the pool.
    released: AtomicU64,
    /// Statements executed to completion.
    executed: AtomicU64,
    /// Rows returned by buffered queries.
    rows_fetched: AtomicU64,
    /// Rows delivered through the streaming executor.
    rows_streamed: AtomicU64,
}

impl GatewayStats {
    /// Records one connection acquisition.
    pub(crate) fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one connection release.
    pub(crate) fn record_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one completed statement.
    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records rows returned by a buffered query.
    pub(crate) fn record_rows_fetched(&self, rows: u64) {
        self.rows_fetched.fetch_add(rows, Ordering::Relaxed);
    }

    /// Records one row delivered through a stream.
    pub(crate) fn record_row_streamed(&self) {
        self.rows_streamed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            rows_fetched: self.rows_fetched.load(Ordering::Relaxed),
            rows_streamed: self.rows_streamed.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Point-in-time view of gateway counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GatewayStatsSnapshot {
    /// Connections handed out by the pool.
    pub acquired: u64,
    /// Connections returned to the pool.
    pub released: u64,
    /// Statements executed to completion.
    pub executed: u64,
    /// Rows returned by buffered queries.
    pub rows_fetched: u64,
    /// Rows delivered through the streaming executor.
    pub rows_streamed: u64,
}
