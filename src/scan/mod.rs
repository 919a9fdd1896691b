//! Scan module
//!
//! Supports: DynamoDB tables, in-memory/JSON Lines dumps
//!
//! # Overview
//!
//! The scan module walks a whole table in bounded pages. A [`TableSource`]
//! answers one page per call and hands back an opaque continuation cursor;
//! the [`Scanner`] threads that cursor through successive calls and stops
//! once the source returns none.

mod dynamo;
mod memory;
mod scanner;
mod types;

pub use dynamo::{attribute_to_json, item_to_record, DynamoCursor, DynamoDbSource};
pub use memory::{MemorySource, DEFAULT_PAGE_SIZE};
pub use scanner::Scanner;
pub use types::{Page, ScanPage, ScanState, TableSource};

#[cfg(test)]
mod tests;
