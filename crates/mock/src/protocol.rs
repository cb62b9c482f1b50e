//! Request and response shapes of the DynamoDB JSON 1.0 protocol.
//!
//! Only the members the mock understands are declared; anything else a
//! client sends is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Item;
use crate::AttributeValue;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTableInput {
    pub table_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    pub billing_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableNameInput {
    pub table_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemInput {
    pub table_name: String,
    pub key: Item,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRequest {
    pub item: Item,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRequest {
    pub put_request: Option<PutRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchWriteItemInput {
    pub request_items: HashMap<String, Vec<WriteRequest>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanInput {
    pub table_name: String,
    pub filter_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, AttributeValue>>,
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<Item>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryInput {
    pub table_name: String,
    pub key_condition_expression: Option<String>,
    pub filter_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, AttributeValue>>,
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughputDescription {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
    pub number_of_decreases_today: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescription {
    pub table_name: String,
    pub table_arn: String,
    pub table_status: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub provisioned_throughput: ProvisionedThroughputDescription,
    pub item_count: usize,
}

/// One page of a scan or query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Page {
    pub items: Vec<Item>,
    pub count: usize,
    pub scanned_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_input_from_sdk_json() {
        let input: ScanInput = serde_json::from_str(
            r##"{
                "TableName": "LargeItem",
                "FilterExpression": "#s = :s",
                "ExpressionAttributeNames": {"#s": "string"},
                "ExpressionAttributeValues": {":s": {"S": "Lion"}},
                "ReturnConsumedCapacity": "NONE"
            }"##,
        )
        .unwrap();

        assert_eq!(input.table_name, "LargeItem");
        assert_eq!(input.filter_expression.as_deref(), Some("#s = :s"));
        assert_eq!(
            input.expression_attribute_values.unwrap()[":s"],
            AttributeValue::S("Lion".to_string())
        );
        assert!(input.limit.is_none());
    }

    #[test]
    fn test_page_omits_absent_start_key() {
        let page = Page {
            items: Vec::new(),
            count: 0,
            scanned_count: 10,
            last_evaluated_key: None,
        };
        assert_eq!(
            serde_json::to_string(&page).unwrap(),
            r#"{"Items":[],"Count":0,"ScannedCount":10}"#
        );
    }

    #[test]
    fn test_delete_requests_are_not_understood() {
        let input: BatchWriteItemInput = serde_json::from_str(
            r#"{"RequestItems": {"LargeItem": [{"DeleteRequest": {"Key": {"id": {"S": "a"}}}}]}}"#,
        )
        .unwrap();
        assert!(input.request_items["LargeItem"][0].put_request.is_none());
    }
}
