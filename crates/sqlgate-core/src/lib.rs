// crates/sqlgate-core/src/lib.rs
// ============================================================================
// Module: Sqlgate Core Library
// Description: Schema model, record validation, and parameterized SQL planning.
// Purpose: Provide the pure, I/O-free half of the Sqlgate data-access layer.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Sqlgate Core holds everything that can be computed without touching a
//! database connection: the semantic type vocabulary and per-column field
//! descriptors, the record validator, and the query planners that turn
//! records into SQL text plus ordered bound parameters.
//! Invariants:
//! - No function in this crate performs I/O or reads wall-clock time.
//! - All variable data travels as bound parameters; only trusted identifiers
//!   and numerically typed limits are interpolated into SQL text.
//! - Validation results are data, never errors; callers branch on presence.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod plan;
pub mod record;
pub mod schema;
pub mod stamp;
pub mod validate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use plan::PlanError;
pub use plan::QueryPlan;
pub use plan::SelectOptions;
pub use record::Record;
pub use schema::FieldDescriptor;
pub use schema::FieldMap;
pub use schema::SchemaMap;
pub use schema::SemanticType;
pub use validate::ValidationReport;
pub use validate::validate;
