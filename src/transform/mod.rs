//! Transform module
//!
//! Turns schema-less records into flat rows.
//!
//! # Overview
//!
//! The transform module provides:
//! - `RecordTransformer` - field map extraction with defaults and discriminator routing
//! - `encode_nested` / `decode_nested` - single-cell text encoding of lists and maps
//! - `FlatRow` - an ordered column/value row

mod encode;
mod transformer;
mod types;

pub use encode::{decode_nested, encode_nested, render_cell};
pub use transformer::{flatten, PageOutcome, RecordTransformer, UNKNOWN_RECORD_ID};
pub use types::{FlatRow, RecordFailure, RoutedRow};

#[cfg(test)]
mod tests;
