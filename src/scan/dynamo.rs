//! DynamoDB table source
//!
//! Scans a table with `ExclusiveStartKey`/`LastEvaluatedKey` paging and
//! converts every item into a plain JSON object.

use super::types::{ScanPage, TableSource};
use crate::error::{Error, Result};
use crate::types::{JsonValue, RawRecord};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use base64::Engine as _;
use std::collections::HashMap;

/// Cursor of a DynamoDB scan: the last evaluated primary key
pub type DynamoCursor = HashMap<String, AttributeValue>;

/// Source scanning one DynamoDB table
#[derive(Debug, Clone)]
pub struct DynamoDbSource {
    client: Client,
    table: String,
    page_size: Option<u32>,
}

impl DynamoDbSource {
    /// Create a source from an existing client
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
            page_size: None,
        }
    }

    /// Create a source using the default credential chain for `region`
    pub async fn from_env(region: &str, table: impl Into<String>) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config), table)
    }

    /// Bound the number of items evaluated per page
    #[must_use]
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl TableSource for DynamoDbSource {
    type Cursor = DynamoCursor;

    fn table_name(&self) -> &str {
        &self.table
    }

    async fn scan_page(&self, cursor: Option<DynamoCursor>) -> Result<ScanPage<DynamoCursor>> {
        let limit = self
            .page_size
            .map(|size| i32::try_from(size).unwrap_or(i32::MAX));

        let output = self
            .client
            .scan()
            .table_name(&self.table)
            .set_exclusive_start_key(cursor)
            .set_limit(limit)
            .send()
            .await
            .map_err(|e| Error::scan(&self.table, DisplayErrorContext(&e).to_string()))?;

        let items = output.items().iter().map(item_to_record).collect();

        Ok(ScanPage {
            items,
            next_cursor: output.last_evaluated_key().cloned(),
        })
    }
}

/// Convert a DynamoDB item into a JSON object
pub fn item_to_record(item: &HashMap<String, AttributeValue>) -> RawRecord {
    item.iter()
        .map(|(name, value)| (name.clone(), attribute_to_json(value)))
        .collect()
}

/// Convert one attribute value into JSON
///
/// Numbers keep the text DynamoDB stored; binary values become base64 text.
pub fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::S(s) => JsonValue::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Null(_) => JsonValue::Null,
        AttributeValue::M(map) => JsonValue::Object(item_to_record(map)),
        AttributeValue::L(list) => JsonValue::Array(list.iter().map(attribute_to_json).collect()),
        AttributeValue::Ss(set) => {
            JsonValue::Array(set.iter().cloned().map(JsonValue::String).collect())
        }
        AttributeValue::Ns(set) => JsonValue::Array(set.iter().map(|n| number_to_json(n)).collect()),
        AttributeValue::B(blob) => JsonValue::String(
            base64::engine::general_purpose::STANDARD.encode(blob.as_ref()),
        ),
        AttributeValue::Bs(set) => JsonValue::Array(
            set.iter()
                .map(|blob| {
                    JsonValue::String(
                        base64::engine::general_purpose::STANDARD.encode(blob.as_ref()),
                    )
                })
                .collect(),
        ),
        _ => JsonValue::Null,
    }
}

/// Parse a DynamoDB number string
///
/// The number keeps its exact text, so trailing zeros and digits beyond
/// `f64` precision survive. Text that is not a JSON number is kept as a
/// string.
fn number_to_json(n: &str) -> JsonValue {
    n.parse::<serde_json::Number>()
        .map_or_else(|_| JsonValue::String(n.to_string()), JsonValue::Number)
}
