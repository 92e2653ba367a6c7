// crates/sqlgate-core/src/plan.rs
// ============================================================================
// Module: Sqlgate Query Planner
// Description: Parameterized SQL construction for CRUD operations.
// Purpose: Turn records and filters into SQL text plus ordered bound
//          parameters.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Planners compose SELECT, INSERT, UPDATE, UPSERT, and DELETE statements
//! from records and field maps. Column and table names originate from code
//! and are interpolated directly; every variable value travels as a bound
//! parameter. Limits and offsets are typed integers, so the interpolated
//! form cannot carry injection payloads.
//! Invariants:
//! - Parameter order always matches placeholder order.
//! - Precondition failures are raised before any I/O is attempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;

use serde_json::Value;
use thiserror::Error;

use crate::record::Record;

// ============================================================================
// SECTION: Plan Types
// ============================================================================

/// A generated SQL statement plus its ordered bound parameters.
///
/// # Invariants
/// - `params` holds one entry per `?` placeholder, in placeholder order.
/// - Array-valued parameters correspond to `IN (?)` placeholders and are
///   expanded positionally by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Statement text with `?` placeholders.
    pub sql: String,
    /// Ordered bound parameter values.
    pub params: Vec<Value>,
}

/// Projection and paging options for SELECT plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Single column to project instead of `*`.
    pub column: Option<String>,
    /// Maximum number of rows to return.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: Option<u64>,
}

/// Precondition failures raised before any I/O.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Update or delete was requested without a primary key value.
    #[error("record for table {table} carries no {column} value")]
    MissingPrimaryKey {
        /// Target table name.
        table: String,
        /// Resolved primary key column.
        column: String,
    },
    /// Insert or update was requested with no writable columns.
    #[error("record for table {table} has no writable columns")]
    EmptyRecord {
        /// Target table name.
        table: String,
    },
}

// ============================================================================
// SECTION: Filter Clause
// ============================================================================

/// Builds the conjunctive filter clause for a record of filter pairs.
///
/// Scalar values emit `column = ?`; array values emit `column IN (?)` with
/// the whole array as a single bound parameter. An empty filter yields an
/// empty clause (and the caller omits WHERE entirely).
#[must_use]
pub fn filter_clause(filter: &Record) -> (String, Vec<Value>) {
    let mut clauses = Vec::with_capacity(filter.len());
    let mut params = Vec::with_capacity(filter.len());
    for (column, value) in filter {
        if value.is_array() {
            clauses.push(format!("{column} IN (?)"));
        } else {
            clauses.push(format!("{column} = ?"));
        }
        params.push(value.clone());
    }
    (clauses.join(" AND "), params)
}

// ============================================================================
// SECTION: Read Plans
// ============================================================================

/// Builds a SELECT plan with optional projection, limit, and offset.
#[must_use]
pub fn select(table: &str, filter: &Record, options: &SelectOptions) -> QueryPlan {
    let projection = options.column.as_deref().unwrap_or("*");
    let mut sql = format!("SELECT {projection} FROM {table}");
    let (clause, params) = filter_clause(filter);
    if !clause.is_empty() {
        let _ = write!(sql, " WHERE {clause}");
    }
    if let Some(limit) = options.limit {
        let _ = write!(sql, " LIMIT {limit}");
    }
    if let Some(offset) = options.offset {
        let _ = write!(sql, " OFFSET {offset}");
    }
    QueryPlan { sql, params }
}

/// Builds a COUNT plan over the same filter semantics as [`select`].
#[must_use]
pub fn count(table: &str, filter: &Record) -> QueryPlan {
    let mut sql = format!("SELECT COUNT(*) AS total FROM {table}");
    let (clause, params) = filter_clause(filter);
    if !clause.is_empty() {
        let _ = write!(sql, " WHERE {clause}");
    }
    QueryPlan { sql, params }
}

// ============================================================================
// SECTION: Write Plans
// ============================================================================

/// Builds an INSERT plan from the record's columns, in record order.
///
/// # Errors
///
/// Returns [`PlanError::EmptyRecord`] when the record has no columns.
pub fn insert(table: &str, record: &Record, ignore_duplicates: bool) -> Result<QueryPlan, PlanError> {
    if record.is_empty() {
        return Err(PlanError::EmptyRecord { table: table.to_string() });
    }
    let columns: Vec<&str> = record.keys().map(String::as_str).collect();
    let placeholders = vec!["?"; record.len()].join(", ");
    let verb = if ignore_duplicates { "INSERT IGNORE" } else { "INSERT" };
    let sql = format!("{verb} INTO {table} ({}) VALUES ({placeholders})", columns.join(", "));
    Ok(QueryPlan { sql, params: record.values().cloned().collect() })
}

/// Builds an UPDATE plan scoped by primary key equality.
///
/// The primary key column is excluded from the SET list and bound last as
/// the WHERE parameter. The driver reports changed rows, so a row matched
/// by key but identical in content counts zero.
///
/// # Errors
///
/// Returns [`PlanError::MissingPrimaryKey`] when the record carries no
/// primary key value (or a null one) and [`PlanError::EmptyRecord`] when
/// nothing besides the key would be written.
pub fn update(table: &str, pk_column: &str, record: &Record) -> Result<QueryPlan, PlanError> {
    let id = record.get(pk_column).filter(|value| !value.is_null()).ok_or_else(|| {
        PlanError::MissingPrimaryKey {
            table: table.to_string(),
            column: pk_column.to_string(),
        }
    })?;
    let mut assignments = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (column, value) in record {
        if column != pk_column {
            assignments.push(format!("{column} = ?"));
            params.push(value.clone());
        }
    }
    if assignments.is_empty() {
        return Err(PlanError::EmptyRecord { table: table.to_string() });
    }
    params.push(id.clone());
    let sql = format!("UPDATE {table} SET {} WHERE {pk_column} = ?", assignments.join(", "));
    Ok(QueryPlan { sql, params })
}

/// Builds an INSERT plan with an on-duplicate-key fallback.
///
/// The fallback rewrites every column to the incoming value except the
/// named creation columns, which are only ever set on insert. When every
/// column is a creation column the plan degrades to the plain insert.
///
/// The outcome is ambiguous by contract: a fresh insert, an update, and a
/// no-op write identical to the existing row are distinguishable only by
/// comparing the assigned identifier against the affected-row count, and
/// the no-op case is indistinguishable from "nothing happened". Both raw
/// signals are surfaced to the caller.
///
/// # Errors
///
/// Returns [`PlanError::EmptyRecord`] when the record has no columns.
pub fn upsert(table: &str, record: &Record, creation_columns: &[&str]) -> Result<QueryPlan, PlanError> {
    let base = insert(table, record, false)?;
    let rewrites: Vec<String> = record
        .keys()
        .filter(|column| !creation_columns.contains(&column.as_str()))
        .map(|column| format!("{column} = VALUES({column})"))
        .collect();
    if rewrites.is_empty() {
        return Ok(base);
    }
    Ok(QueryPlan {
        sql: format!("{} ON DUPLICATE KEY UPDATE {}", base.sql, rewrites.join(", ")),
        params: base.params,
    })
}

/// Builds a DELETE plan scoped by primary key equality.
#[must_use]
pub fn delete(table: &str, pk_column: &str, id: Value) -> QueryPlan {
    QueryPlan {
        sql: format!("DELETE FROM {table} WHERE {pk_column} = ?"),
        params: vec![id],
    }
}
