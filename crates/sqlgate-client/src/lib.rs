// crates/sqlgate-client/src/lib.rs
// ============================================================================
// Module: Sqlgate Client Library
// Description: Runtime half of the Sqlgate data-access layer.
// Purpose: Execute planned SQL over pooled connections with schema caching
//          and backpressure-aware streaming.
// Dependencies: sqlgate-core, async-trait, serde, serde_json, thiserror,
//               time, tokio
// ============================================================================

//! ## Overview
//! Sqlgate Client wires the pure core (schema model, validator, planners)
//! to a driver behind backend-agnostic seams: the [`ConnectionGateway`]
//! guarantees release-on-every-exit connection lifecycle, the
//! [`SchemaRegistry`] caches catalog metadata loaded in one round trip, the
//! streaming executor delivers rows no faster than the consumer
//! acknowledges them, and [`Entity`] exposes the CRUD surface application
//! code works with.
//! Invariants:
//! - Acquired connections are released exactly once on every exit path.
//! - Readers never observe a partially-loaded schema.
//! - A streamed row is never pulled before the prior row's acknowledgment.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod driver;
pub mod entity;
pub mod gateway;
pub mod registry;
pub mod stats;
pub mod stream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use driver::Connection;
pub use driver::ConnectionPool;
pub use driver::DriverError;
pub use driver::ExecuteOutcome;
pub use driver::Row;
pub use driver::RowSink;
pub use driver::RowSource;
pub use driver::SharedPool;
pub use driver::SinkError;
pub use entity::Clock;
pub use entity::Entity;
pub use entity::EntityError;
pub use entity::EntityOptions;
pub use entity::SystemClock;
pub use gateway::ConnectionGateway;
pub use gateway::GatewayError;
pub use gateway::rows_to_pairs;
pub use registry::RegistryError;
pub use registry::SCHEMA_QUERY;
pub use registry::SchemaRegistry;
pub use registry::SharedFieldMap;
pub use stats::GatewayStats;
pub use stats::GatewayStatsSnapshot;
pub use stream::ChannelRowSink;
pub use stream::ConsumerError;
pub use stream::StreamError;
pub use stream::StreamPhase;
pub use stream::StreamSummary;
pub use stream::stream_each;
pub use stream::stream_into;
