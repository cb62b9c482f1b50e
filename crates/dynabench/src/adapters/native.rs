//! Raw SDK adapter.
//!
//! Builds every request by hand and converts items with the functions in
//! [`super::conversions`].

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use dynabench_core::{Adapter, HarnessError, Predicate, Record, Result};

use super::conversions::{item_to_record, scalar_to_attribute};
use crate::error::{map_get_item_error, map_query_error, map_scan_error};

pub const NAME: &str = "native";

/// A filter expression with its placeholder maps.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Compiles `predicate` into `#nameN <op> :valueN` terms joined by `AND`.
///
/// A predicate without conditions matches everything and compiles to `None`.
pub fn compile_filter(predicate: &Predicate) -> Option<FilterExpression> {
    let mut terms = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (i, condition) in predicate.conditions().into_iter().enumerate() {
        let name = format!("#name{i}");
        let value = format!(":value{i}");
        terms.push(format!("{name} {} {value}", condition.operator.token()));
        names.insert(name, condition.field.attribute_name().to_string());
        values.insert(value, scalar_to_attribute(&condition.value));
    }

    if terms.is_empty() {
        return None;
    }

    Some(FilterExpression {
        expression: terms.join(" AND "),
        names,
        values,
    })
}

/// Adapter issuing raw `GetItem`, `Scan` and `Query` calls.
#[derive(Debug, Clone)]
pub struct NativeSdkAdapter {
    client: Client,
    table_name: String,
}

impl NativeSdkAdapter {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl Adapter for NativeSdkAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn get_by_id(&self, id: &str) -> Result<Record> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(item) => item_to_record(&item),
            None => Err(HarnessError::NotFound { id: id.to_string() }),
        }
    }

    async fn scan_filter(&self, predicate: &Predicate) -> Result<Vec<Record>> {
        let filter = compile_filter(predicate);
        let mut records = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let result = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_filter_expression(filter.as_ref().map(|f| f.expression.clone()))
                .set_expression_attribute_names(filter.as_ref().map(|f| f.names.clone()))
                .set_expression_attribute_values(filter.as_ref().map(|f| f.values.clone()))
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(map_scan_error)?;

            for item in result.items() {
                records.push(item_to_record(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        tracing::debug!(adapter = NAME, records = records.len(), "Scan complete");
        Ok(records)
    }

    async fn query_by_id(&self, id: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#idName = :idValue")
                .expression_attribute_names("#idName", "id")
                .expression_attribute_values(":idValue", AttributeValue::S(id.to_string()))
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            for item in result.items() {
                records.push(item_to_record(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(records)
    }
}
