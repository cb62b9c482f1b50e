//! Schema-declared data mapper adapter.
//!
//! A [`TableMapping`] declares the table and attribute schema of a type;
//! [`DataMapper`] marshalls documents by walking that schema and builds
//! filter expressions from [`ConditionExpression`] trees.

pub mod condition;
pub mod schema;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use dynabench_core::{Adapter, HarnessError, Operator, Predicate, Record, Result, Scalar};
use serde::de::DeserializeOwned;
use serde_json::Value;

use self::condition::{ConditionExpression, ExpressionAttributes};
use self::schema::{CustomType, FieldSchema, KeyType, Schema, SchemaType};
use crate::error::{map_get_item_error, map_query_error, map_scan_error};

pub const NAME: &str = "mapper";

/// The table and schema a type is stored under.
#[derive(Debug, Clone)]
pub struct TableMapping {
    pub table_name: String,
    pub schema: Schema,
}

impl TableMapping {
    fn hash_key(&self) -> Result<&'static str> {
        self.schema
            .hash_key()
            .map(|field| field.name)
            .ok_or_else(|| {
                HarnessError::RequestFailed(format!(
                    "Schema of table {} declares no hash key",
                    self.table_name
                ))
            })
    }

    fn key(&self, value: Value) -> Result<(String, AttributeValue)> {
        let name = self.hash_key()?;
        let value = self.schema.marshall_value(name, &value)?;
        Ok((name.to_string(), value))
    }
}

/// `""` and `null` are stored as `NULL`; both `NULL` and `S("")` read back
/// as `null`.
pub const NULLABLE_STRING: CustomType = CustomType {
    marshall: marshall_nullable,
    unmarshall: unmarshall_nullable,
};

fn marshall_nullable(value: &Value) -> Result<AttributeValue> {
    match value {
        Value::Null => Ok(AttributeValue::Null(true)),
        Value::String(s) if s.is_empty() => Ok(AttributeValue::Null(true)),
        Value::String(s) => Ok(AttributeValue::S(s.clone())),
        other => Err(HarnessError::Decode(format!(
            "Expected string or null, found {other}"
        ))),
    }
}

fn unmarshall_nullable(value: &AttributeValue) -> Result<Value> {
    match value {
        AttributeValue::Null(true) => Ok(Value::Null),
        AttributeValue::S(s) if s.is_empty() => Ok(Value::Null),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        other => Err(HarnessError::Decode(format!(
            "Expected S or NULL, found {other:?}"
        ))),
    }
}

/// Mapping of [`Record`] onto `table_name`.
pub fn record_mapping(table_name: impl Into<String>) -> TableMapping {
    let field = |name, kind, key_type| FieldSchema {
        name,
        kind,
        key_type,
    };
    TableMapping {
        table_name: table_name.into(),
        schema: Schema::new(vec![
            field("id", SchemaType::String, Some(KeyType::Hash)),
            field("boolean", SchemaType::Boolean, None),
            field("string", SchemaType::String, None),
            field("nullable", SchemaType::Custom(NULLABLE_STRING), None),
            field("number", SchemaType::Number, None),
            field(
                "externalIdList",
                SchemaType::List(Box::new(SchemaType::String)),
                None,
            ),
            field(
                "numberList",
                SchemaType::List(Box::new(SchemaType::Number)),
                None,
            ),
            field("nested", SchemaType::Any, None),
        ]),
    }
}

/// Translates a predicate into a condition tree.
pub fn predicate_to_condition(predicate: &Predicate) -> ConditionExpression {
    match predicate {
        Predicate::And(parts) => {
            ConditionExpression::And(parts.iter().map(predicate_to_condition).collect())
        }
        Predicate::Compare(condition) => {
            let subject = condition.field.attribute_name();
            let value = match &condition.value {
                Scalar::Bool(b) => Value::Bool(*b),
                Scalar::Number(n) => Value::from(*n),
                Scalar::String(s) => Value::String(s.clone()),
            };
            match condition.operator {
                Operator::Eq => condition::equals(subject, value),
                Operator::Gt => condition::greater_than(subject, value),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataMapper {
    client: Client,
}

impl DataMapper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches the document whose hash key is `key`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        mapping: &TableMapping,
        key: impl Into<Value>,
    ) -> Result<Option<T>> {
        let (name, value) = mapping.key(key.into())?;
        let result = self
            .client
            .get_item()
            .table_name(&mapping.table_name)
            .key(name, value)
            .send()
            .await
            .map_err(map_get_item_error)?;

        result
            .item
            .map(|item| unmarshall_document(mapping, &item))
            .transpose()
    }

    /// Scans the whole table, consuming every page. An empty filter is
    /// not sent.
    pub async fn scan<T: DeserializeOwned>(
        &self,
        mapping: &TableMapping,
        filter: Option<&ConditionExpression>,
    ) -> Result<Vec<T>> {
        let mut attributes = ExpressionAttributes::default();
        let filter_expression = filter
            .filter(|filter| !filter.is_empty())
            .map(|filter| attributes.serialize(filter, &mapping.schema))
            .transpose()?;

        let mut pages = self
            .client
            .scan()
            .table_name(&mapping.table_name)
            .set_filter_expression(filter_expression)
            .set_expression_attribute_names(attributes.names())
            .set_expression_attribute_values(attributes.values())
            .into_paginator()
            .items()
            .send();

        let mut documents = Vec::new();
        while let Some(item) = pages.next().await {
            let item = item.map_err(map_scan_error)?;
            documents.push(unmarshall_document(mapping, &item)?);
        }
        Ok(documents)
    }

    /// Queries every document whose hash key is `key`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        mapping: &TableMapping,
        key: impl Into<Value>,
        filter: Option<&ConditionExpression>,
    ) -> Result<Vec<T>> {
        let hash_key = mapping.hash_key()?;
        let mut attributes = ExpressionAttributes::default();
        let key_condition =
            attributes.serialize(&condition::equals(hash_key, key.into()), &mapping.schema)?;
        let filter_expression = filter
            .filter(|filter| !filter.is_empty())
            .map(|filter| attributes.serialize(filter, &mapping.schema))
            .transpose()?;

        let mut pages = self
            .client
            .query()
            .table_name(&mapping.table_name)
            .key_condition_expression(key_condition)
            .set_filter_expression(filter_expression)
            .set_expression_attribute_names(attributes.names())
            .set_expression_attribute_values(attributes.values())
            .into_paginator()
            .items()
            .send();

        let mut documents = Vec::new();
        while let Some(item) = pages.next().await {
            let item = item.map_err(map_query_error)?;
            documents.push(unmarshall_document(mapping, &item)?);
        }
        Ok(documents)
    }
}

fn unmarshall_document<T: DeserializeOwned>(
    mapping: &TableMapping,
    item: &std::collections::HashMap<String, AttributeValue>,
) -> Result<T> {
    let document = mapping.schema.unmarshall_item(item)?;
    serde_json::from_value(Value::Object(document))
        .map_err(|e| HarnessError::Decode(e.to_string()))
}

/// Adapter driving a [`DataMapper`] over [`record_mapping`].
#[derive(Debug, Clone)]
pub struct DataMapperAdapter {
    mapper: DataMapper,
    mapping: TableMapping,
}

impl DataMapperAdapter {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            mapper: DataMapper::new(client),
            mapping: record_mapping(table_name),
        }
    }
}

#[async_trait]
impl Adapter for DataMapperAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn get_by_id(&self, id: &str) -> Result<Record> {
        self.mapper
            .get(&self.mapping, id)
            .await?
            .ok_or_else(|| HarnessError::NotFound { id: id.to_string() })
    }

    async fn scan_filter(&self, predicate: &Predicate) -> Result<Vec<Record>> {
        let condition = predicate_to_condition(predicate);
        self.mapper.scan(&self.mapping, Some(&condition)).await
    }

    async fn query_by_id(&self, id: &str) -> Result<Vec<Record>> {
        self.mapper.query(&self.mapping, id, None).await
    }
}
