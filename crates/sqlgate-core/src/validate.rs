// crates/sqlgate-core/src/validate.rs
// ============================================================================
// Module: Sqlgate Record Validator
// Description: Schema-driven validation of loosely-typed records.
// Purpose: Produce structured violation reports without performing I/O.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The validator checks a record against a table's field map: field
//! existence, nullability, maximum length, and semantic type compatibility.
//! It is a pure function of its two inputs and returns violations as data,
//! never as an error.
//!
//! Documented policy: vacancy is coarse. Null, the empty string, numeric
//! zero, and `false` all count as "absent", so any of them passes outright
//! on a nullable field. A vacant value on a non-nullable field falls through
//! to the ordinary length and type checks (null then fails the type check).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

use crate::record::Record;
use crate::record::is_vacant;
use crate::record::text_len;
use crate::schema::FieldDescriptor;
use crate::schema::FieldMap;
use crate::schema::SemanticType;

// ============================================================================
// SECTION: Report Type
// ============================================================================

/// Mapping from field name to its non-empty, ordered violation list.
///
/// Absence of a field means the field is valid; an empty report is never
/// constructed; "no errors" is represented by `None` at the call site so
/// callers can branch on presence alone.
pub type ValidationReport = BTreeMap<String, Vec<String>>;

/// Display width that marks a numeric column as boolean-as-tinyint.
const BOOLEAN_TINYINT_WIDTH: u32 = 3;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a record against a table's field map.
///
/// Returns `None` when every field passes, otherwise the mapping from field
/// name to violation messages. Fields absent from the record are never
/// checked; required-column enforcement is the database's job.
#[must_use]
pub fn validate(fields: &FieldMap, record: &Record) -> Option<ValidationReport> {
    let mut report = ValidationReport::new();
    for (name, value) in record {
        let violations = match fields.get(name) {
            None => vec!["unknown field".to_string()],
            Some(field) => field_violations(field, value),
        };
        if !violations.is_empty() {
            report.insert(name.clone(), violations);
        }
    }
    if report.is_empty() { None } else { Some(report) }
}

/// Collects violations for one known field.
fn field_violations(field: &FieldDescriptor, value: &Value) -> Vec<String> {
    if is_vacant(value) && field.nullable {
        return Vec::new();
    }
    let mut violations = Vec::new();
    if let Some(limit) = field.max_length
        && usize::try_from(limit).is_ok_and(|max| text_len(value) > max)
    {
        violations.push(format!("maximum length is {limit}"));
    }
    if !type_matches(field, value) {
        violations.push(format!("should be a {}", field.semantic));
    }
    violations
}

/// Checks a value's runtime type against the field's semantic type.
///
/// Two explicit coercions are accepted for number fields: booleans on
/// columns with display width [`BOOLEAN_TINYINT_WIDTH`] (the
/// boolean-as-tinyint convention) and strings made entirely of ASCII digits
/// (numerics arriving from query strings or JSON-as-text).
fn type_matches(field: &FieldDescriptor, value: &Value) -> bool {
    match field.semantic {
        SemanticType::Number => match value {
            Value::Number(_) => true,
            Value::Bool(_) => field.max_length == Some(BOOLEAN_TINYINT_WIDTH),
            Value::String(text) => is_digit_string(text),
            Value::Null | Value::Array(_) | Value::Object(_) => false,
        },
        SemanticType::Text => matches!(value, Value::String(_)),
        SemanticType::Boolean => matches!(value, Value::Bool(_)),
    }
}

/// Reports whether a string is a non-empty run of ASCII digits.
fn is_digit_string(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}
