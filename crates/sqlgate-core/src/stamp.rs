// crates/sqlgate-core/src/stamp.rs
// ============================================================================
// Module: Sqlgate Timestamp Rendering
// Description: Canonical timestamp format for creation/update columns.
// Purpose: Render wall-clock moments the way timestamp columns store them.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Timestamp columns store `YYYY-MM-DD hh:mm:ss` text. This module owns the
//! format description; it never reads wall-clock time itself. Clients
//! supply the moment (see the client crate's clock seam), keeping core
//! behavior deterministic and replayable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Format
// ============================================================================

/// Column format for creation/update timestamps.
const STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Renders a moment in the canonical column format.
///
/// The format description is checked at compile time, so formatting cannot
/// fail for valid moments; a defective moment renders empty.
#[must_use]
pub fn render_stamp(moment: OffsetDateTime) -> String {
    moment.format(STAMP_FORMAT).unwrap_or_default()
}
