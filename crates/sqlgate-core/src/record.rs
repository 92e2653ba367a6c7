// crates/sqlgate-core/src/record.rs
// ============================================================================
// Module: Sqlgate Record Model
// Description: Loosely-typed records and value rendering helpers.
// Purpose: Represent untyped caller input as tagged JSON values with
//          deterministic column ordering.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A record is an ordered mapping from column name to a loosely-typed value
//! (`serde_json::Value`): null, boolean, number, string, or array of scalars
//! for `IN` filters. Records serve both as validator input and as
//! insert/update payloads; the map ordering fixes column order so that
//! placeholder lists always line up with column lists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

// ============================================================================
// SECTION: Record Type
// ============================================================================

/// Ordered mapping from column name to loosely-typed value.
pub type Record = BTreeMap<String, Value>;

// ============================================================================
// SECTION: Value Helpers
// ============================================================================

/// Reports whether a value counts as absent for nullability purposes.
///
/// Null, the empty string, numeric zero, and `false` are all vacant. This
/// deliberately folds legitimate falsy values into "absent"; see the
/// validator documentation for the resulting policy.
#[must_use]
pub fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !*flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Renders a value as the plain text it would occupy in a column.
///
/// Strings render without quotes, null renders empty, and compound values
/// fall back to their JSON serialization.
#[must_use]
pub fn render_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Returns the textual length of a value's rendering in characters.
#[must_use]
pub fn text_len(value: &Value) -> usize {
    render_text(value).chars().count()
}
