// crates/sqlgate-client/src/stream.rs
// ============================================================================
// Module: Sqlgate Streaming Executor
// Description: Backpressure-aware row delivery over pooled connections.
// Purpose: Deliver large result sets one row at a time, gated by the
//          consumer, with release-on-every-exit connection lifecycle.
// Dependencies: sqlgate-core, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! The streaming executor drives a pull-based row source and hands each row
//! to a consumer, awaiting the consumer's acknowledgment before pulling the
//! next row. The producer therefore never outruns the consumer. A piped
//! variant forwards rows into a [`RowSink`] and honors the sink's native
//! flow control instead of a manual per-row handshake.
//! Invariants:
//! - Rows are delivered in database order, strictly one at a time.
//! - Row k+1 is never pulled before row k's acknowledgment resolves.
//! - The connection is released exactly once on every exit: end of
//!   results, query failure, consumer failure, or sink failure.
//! - No row is delivered after a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::driver::Connection;
use crate::driver::DriverError;
use crate::driver::Row;
use crate::driver::RowSink;
use crate::driver::SinkError;
use crate::gateway::ConnectionGateway;
use crate::gateway::GatewayError;

// ============================================================================
// SECTION: Stream Errors
// ============================================================================

/// A streaming consumer's own failure, carried as text.
#[derive(Debug, Error)]
#[error("consumer failure: {0}")]
pub struct ConsumerError(pub String);

impl ConsumerError {
    /// Creates a consumer error from any displayable cause.
    #[must_use]
    pub fn new(cause: impl Into<String>) -> Self {
        Self(cause.into())
    }
}

/// Errors raised by streaming execution.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Whatever the variant, the connection was released before the error
///   propagated.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Connection acquisition failed.
    #[error("stream acquire failed: {0}")]
    Acquire(#[source] GatewayError),
    /// The streamed statement could not be dispatched.
    #[error("stream open failed: {0}")]
    Open(#[source] DriverError),
    /// The stream failed mid-flight.
    #[error("stream read failed: {0}")]
    Read(#[source] DriverError),
    /// The consumer rejected a row.
    #[error("stream consumer failed: {0}")]
    Consumer(#[source] ConsumerError),
    /// The downstream sink rejected a row or failed to finalize.
    #[error("stream sink failed: {0}")]
    Sink(#[source] SinkError),
}

// ============================================================================
// SECTION: Phases
// ============================================================================

/// Lifecycle of one streaming call.
///
/// # Invariants
/// - Transitions follow `Idle -> Opened -> (Delivering -> Paused)* ->
///   Completed | Failed`; terminal phases are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No connection acquired yet.
    Idle,
    /// Connection acquired and streaming query dispatched.
    Opened,
    /// A row is being handed to the consumer.
    Delivering,
    /// Waiting for the consumer's acknowledgment; no rows are pulled.
    Paused,
    /// End of results reached and connection released.
    Completed,
    /// A failure terminated the stream; the connection was released.
    Failed,
}

/// Result of a completed streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Rows delivered and acknowledged.
    pub rows: u64,
    /// Terminal phase; always [`StreamPhase::Completed`] on success.
    pub phase: StreamPhase,
}

// ============================================================================
// SECTION: Callback Streaming
// ============================================================================

/// Streams a query one row at a time through an acknowledging consumer.
///
/// The consumer returns a future per row; the executor awaits it before
/// pulling the next row, so the consumer's processing speed gates the
/// connection read rate. A consumer failure on row k stops delivery; no
/// row after k is observed.
///
/// # Errors
///
/// Returns [`StreamError`] on acquisition, dispatch, read, or consumer
/// failure; the connection is released before the error is returned.
pub async fn stream_each<F, Fut>(
    gateway: &ConnectionGateway,
    sql: &str,
    params: &[Value],
    read_buffer_rows: usize,
    mut consumer: F,
) -> Result<StreamSummary, StreamError>
where
    F: FnMut(Row) -> Fut + Send,
    Fut: Future<Output = Result<(), ConsumerError>> + Send,
{
    let mut phase = StreamPhase::Idle;
    let mut connection = gateway.acquire().await.map_err(StreamError::Acquire)?;
    let driven = drive_rows(
        gateway,
        connection.as_mut(),
        sql,
        params,
        read_buffer_rows,
        &mut phase,
        &mut consumer,
    )
    .await;
    gateway.release(connection).await;
    driven.map(|rows| StreamSummary { rows, phase })
}

/// Pulls rows and hands them to the consumer until end of results.
async fn drive_rows<F, Fut>(
    gateway: &ConnectionGateway,
    connection: &mut dyn Connection,
    sql: &str,
    params: &[Value],
    read_buffer_rows: usize,
    phase: &mut StreamPhase,
    consumer: &mut F,
) -> Result<u64, StreamError>
where
    F: FnMut(Row) -> Fut + Send,
    Fut: Future<Output = Result<(), ConsumerError>> + Send,
{
    let outcome = async {
        let mut source = connection
            .open_stream(sql, params, read_buffer_rows)
            .await
            .map_err(StreamError::Open)?;
        *phase = StreamPhase::Opened;
        let mut rows = 0_u64;
        while let Some(row) = source.next_row().await.map_err(StreamError::Read)? {
            *phase = StreamPhase::Delivering;
            let acknowledgment = consumer(row);
            *phase = StreamPhase::Paused;
            acknowledgment.await.map_err(StreamError::Consumer)?;
            gateway.record_row_streamed();
            rows += 1;
        }
        Ok(rows)
    }
    .await;
    *phase = if outcome.is_err() { StreamPhase::Failed } else { StreamPhase::Completed };
    outcome
}

// ============================================================================
// SECTION: Piped Streaming
// ============================================================================

/// Streams a query into a backpressure-capable sink.
///
/// Row delivery honors the sink's own flow control: each `accept` future is
/// awaited before the next row is pulled, and `complete` runs after end of
/// results. The executor's remaining job is lifecycle management: the
/// connection is released once the sink reports completion or on the first
/// failure.
///
/// # Errors
///
/// Returns [`StreamError`] on acquisition, dispatch, read, or sink failure;
/// the connection is released before the error is returned.
pub async fn stream_into(
    gateway: &ConnectionGateway,
    sql: &str,
    params: &[Value],
    read_buffer_rows: usize,
    sink: &mut dyn RowSink,
) -> Result<StreamSummary, StreamError> {
    let mut phase = StreamPhase::Idle;
    let mut connection = gateway.acquire().await.map_err(StreamError::Acquire)?;
    let driven = pipe_rows(
        gateway,
        connection.as_mut(),
        sql,
        params,
        read_buffer_rows,
        &mut phase,
        sink,
    )
    .await;
    gateway.release(connection).await;
    driven.map(|rows| StreamSummary { rows, phase })
}

/// Pulls rows and forwards them into the sink until end of results.
async fn pipe_rows(
    gateway: &ConnectionGateway,
    connection: &mut dyn Connection,
    sql: &str,
    params: &[Value],
    read_buffer_rows: usize,
    phase: &mut StreamPhase,
    sink: &mut dyn RowSink,
) -> Result<u64, StreamError> {
    let outcome = async {
        let mut source = connection
            .open_stream(sql, params, read_buffer_rows)
            .await
            .map_err(StreamError::Open)?;
        *phase = StreamPhase::Opened;
        let mut rows = 0_u64;
        while let Some(row) = source.next_row().await.map_err(StreamError::Read)? {
            *phase = StreamPhase::Delivering;
            sink.accept(row).await.map_err(StreamError::Sink)?;
            gateway.record_row_streamed();
            rows += 1;
        }
        sink.complete().await.map_err(StreamError::Sink)?;
        Ok(rows)
    }
    .await;
    *phase = if outcome.is_err() { StreamPhase::Failed } else { StreamPhase::Completed };
    outcome
}

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Reference sink forwarding rows into a bounded channel.
///
/// A full channel makes `accept` wait for the receiver, which is exactly
/// the downstream flow-control signal the executor honors.
#[derive(Debug)]
pub struct ChannelRowSink {
    /// Bounded sender feeding the downstream receiver.
    sender: mpsc::Sender<Row>,
}

impl ChannelRowSink {
    /// Creates a sink over the provided bounded sender.
    #[must_use]
    pub const fn new(sender: mpsc::Sender<Row>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl RowSink for ChannelRowSink {
    async fn accept(&mut self, row: Row) -> Result<(), SinkError> {
        self.sender.send(row).await.map_err(|_| SinkError::Closed)
    }

    async fn complete(&mut self) -> Result<(), SinkError> {
        // The channel closes when the sink is dropped; nothing to flush.
        Ok(())
    }
}
