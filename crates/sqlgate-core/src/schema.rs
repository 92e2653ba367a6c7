// crates/sqlgate-core/src/schema.rs
// ============================================================================
// Module: Sqlgate Schema Model
// Description: Field descriptors and the semantic type vocabulary.
// Purpose: Reduce native column types to the three-way vocabulary used by
//          validation and planning.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the per-column metadata loaded from the database
//! catalog and the reduced semantic type vocabulary (number, text, boolean)
//! that the validator and planners work against.
//! Invariants:
//! - Descriptors are immutable once constructed.
//! - Native type bucketing fails open: unrecognized native types map to
//!   text so that writes are never rejected for types the table omits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Semantic Types
// ============================================================================

/// Reduced type vocabulary used for validation, independent of native type.
///
/// # Invariants
/// - Variants are stable for programmatic handling and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Integer, decimal, floating, and bit-like native types.
    Number,
    /// Character, date/time, blob, and any unrecognized native type.
    Text,
    /// Native boolean types.
    Boolean,
}

impl SemanticType {
    /// Returns the lowercase label used in violation messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Text => "text",
            Self::Boolean => "boolean",
        }
    }

    /// Buckets a native column type into the semantic vocabulary.
    ///
    /// Accepts full column type spellings such as `tinyint(3) unsigned`;
    /// matching is case-insensitive and ignores width and attribute
    /// suffixes. Unrecognized native types bucket as [`Self::Text`].
    #[must_use]
    pub fn of_native(column_type: &str) -> Self {
        match base_native(column_type).as_str() {
            "int" | "integer" | "bigint" | "smallint" | "mediumint" | "tinyint" | "decimal"
            | "numeric" | "float" | "double" | "real" | "bit" | "year" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            // char/varchar/text, date/time, blob/binary, enum/set/json, and
            // anything the mapping omits all read and write as text.
            _ => Self::Text,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Field Descriptors
// ============================================================================

/// One column's metadata, normalized from the database catalog.
///
/// # Invariants
/// - Immutable once loaded; the registry replaces whole maps, never fields.
/// - `native_type` is the lowercase base spelling without width suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name.
    pub name: String,
    /// Lowercase native type, e.g. `varchar`.
    pub native_type: String,
    /// Semantic type bucket for validation.
    pub semantic: SemanticType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Maximum textual length: character length for text columns, display
    /// width for numeric columns.
    pub max_length: Option<u32>,
    /// Whether the column is part of the primary key.
    pub primary: bool,
    /// Whether the column carries a unique constraint.
    pub unique: bool,
    /// Column default expression as reported by the catalog.
    pub default_value: Option<String>,
}

impl FieldDescriptor {
    /// Builds a descriptor from one catalog row.
    ///
    /// `column_type` is the full spelling (e.g. `tinyint(3) unsigned`);
    /// `column_key` is the catalog key marker (`PRI`, `UNI`, `MUL`, or
    /// empty). The maximum length prefers the parenthesized display width,
    /// then the character maximum length, then the numeric precision.
    #[must_use]
    pub fn from_catalog(
        name: impl Into<String>,
        column_type: &str,
        nullable: bool,
        char_max_length: Option<u64>,
        numeric_precision: Option<u64>,
        column_key: &str,
        default_value: Option<String>,
    ) -> Self {
        let max_length = parse_display_width(column_type)
            .or_else(|| char_max_length.and_then(|len| u32::try_from(len).ok()))
            .or_else(|| numeric_precision.and_then(|len| u32::try_from(len).ok()));
        Self {
            name: name.into(),
            native_type: base_native(column_type),
            semantic: SemanticType::of_native(column_type),
            nullable,
            max_length,
            primary: column_key == "PRI",
            unique: column_key == "UNI",
            default_value,
        }
    }
}

// ============================================================================
// SECTION: Schema Maps
// ============================================================================

/// Column name to descriptor mapping for one table.
pub type FieldMap = BTreeMap<String, FieldDescriptor>;

/// Table name to field map mapping for the whole database.
pub type SchemaMap = BTreeMap<String, FieldMap>;

/// Resolves the primary key column for a table.
///
/// Returns the first descriptor flagged as primary, or `fallback` when the
/// field map is empty or defines no primary key.
#[must_use]
pub fn primary_key_column(fields: &FieldMap, fallback: &str) -> String {
    fields
        .values()
        .find(|field| field.primary)
        .map_or_else(|| fallback.to_string(), |field| field.name.clone())
}

// ============================================================================
// SECTION: Native Type Helpers
// ============================================================================

/// Returns the lowercase base native type without width or attributes.
#[must_use]
pub fn base_native(column_type: &str) -> String {
    let head = column_type.split('(').next().unwrap_or(column_type);
    head.trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Extracts the parenthesized display width from a column type spelling.
///
/// `tinyint(3)` yields 3 and `decimal(10,2)` yields 10; spellings without a
/// parenthesized width yield `None`.
#[must_use]
pub fn parse_display_width(column_type: &str) -> Option<u32> {
    let start = column_type.find('(')? + 1;
    let rest = column_type.get(start..)?;
    let end = rest.find([',', ')'])?;
    rest.get(..end)?.trim().parse().ok()
}
