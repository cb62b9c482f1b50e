//! Object model adapter.
//!
//! A [`Model`] binds a serde type to a table and exposes a fluent
//! condition builder:
//!
//! ```ignore
//! let lions = model
//!     .scan()
//!     .filter("string")
//!     .eq("Lion")
//!     .filter("number")
//!     .gt(500_000)
//!     .exec()
//!     .await?;
//! ```
//!
//! Items are converted with `serde_dynamo`.

use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use dynabench_core::{Adapter, HarnessError, Operator, Predicate, Record, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{map_get_item_error, map_marshalling_error, map_query_error, map_scan_error};

pub const NAME: &str = "model";

/// A type stored by a [`Model`].
pub trait Document: DeserializeOwned + Send {
    /// Adjusts a freshly decoded value.
    fn normalize(self) -> Self {
        self
    }
}

impl Document for Record {
    fn normalize(mut self) -> Self {
        if self.nullable.as_deref() == Some("") {
            self.nullable = None;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
}

impl Comparison {
    fn token(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    attribute: String,
    comparison: Comparison,
    value: AttributeValue,
}

/// Accumulated filters of a scan or query.
#[derive(Debug, Default)]
struct Conditions {
    filters: Vec<Filter>,
    error: Option<HarnessError>,
}

impl Conditions {
    fn push(&mut self, attribute: String, comparison: Comparison, value: impl Serialize) {
        match serde_dynamo::to_attribute_value::<_, AttributeValue>(value) {
            Ok(value) => self.filters.push(Filter {
                attribute,
                comparison,
                value,
            }),
            Err(err) if self.error.is_none() => self.error = Some(map_marshalling_error(err)),
            Err(_) => {}
        }
    }

    fn check(&mut self) -> Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Renders filters as `#a0 = :v0 AND ...`, continuing the numbering of
/// earlier renders.
#[derive(Debug, Default, PartialEq)]
struct Rendered {
    expression: Option<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl Rendered {
    fn render(&mut self, filters: &[&Filter]) -> Option<String> {
        if filters.is_empty() {
            return None;
        }
        let terms: Vec<String> = filters
            .iter()
            .map(|filter| {
                let i = self.names.len();
                let name = format!("#a{i}");
                let value = format!(":v{i}");
                let term = format!("{name} {} {value}", filter.comparison.token());
                self.names.insert(name, filter.attribute.clone());
                self.values.insert(value, filter.value.clone());
                term
            })
            .collect();
        Some(terms.join(" AND "))
    }

    fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    fn values(&self) -> Option<HashMap<String, AttributeValue>> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}

/// A table bound to a document type.
#[derive(Debug, Clone)]
pub struct Model<T> {
    client: Client,
    table_name: String,
    hash_key: String,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> Model<T> {
    pub fn new(client: Client, table_name: impl Into<String>, hash_key: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            hash_key: hash_key.into(),
            _document: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Fetches the document stored under `key`.
    pub async fn get(&self, key: impl Serialize) -> Result<Option<T>> {
        let key = serde_dynamo::to_attribute_value::<_, AttributeValue>(key)
            .map_err(map_marshalling_error)?;
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(&self.hash_key, key)
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.map(|item| self.decode(item)).transpose()
    }

    pub fn scan(&self) -> Scan<'_, T> {
        Scan {
            model: self,
            conditions: Conditions::default(),
        }
    }

    pub fn query(&self) -> Query<'_, T> {
        Query {
            model: self,
            conditions: Conditions::default(),
        }
    }

    fn decode(&self, item: HashMap<String, AttributeValue>) -> Result<T> {
        let document: T = serde_dynamo::from_item(item).map_err(map_marshalling_error)?;
        Ok(document.normalize())
    }
}

/// Pending `filter(attribute)` awaiting its comparison.
pub struct FilterStep<B> {
    builder: B,
    attribute: String,
}

macro_rules! comparisons {
    ($builder:ident) => {
        impl<'m, T: Document> FilterStep<$builder<'m, T>> {
            pub fn eq(mut self, value: impl Serialize) -> $builder<'m, T> {
                self.builder
                    .conditions
                    .push(self.attribute, Comparison::Eq, value);
                self.builder
            }

            pub fn gt(mut self, value: impl Serialize) -> $builder<'m, T> {
                self.builder
                    .conditions
                    .push(self.attribute, Comparison::Gt, value);
                self.builder
            }
        }

        impl<'m, T: Document> $builder<'m, T> {
            pub fn filter(self, attribute: impl Into<String>) -> FilterStep<Self> {
                FilterStep {
                    builder: self,
                    attribute: attribute.into(),
                }
            }
        }
    };
}

comparisons!(Scan);
comparisons!(Query);

/// A scan under construction.
pub struct Scan<'m, T> {
    model: &'m Model<T>,
    conditions: Conditions,
}

impl<T: Document> Scan<'_, T> {
    /// Runs the scan, following pagination until the table is exhausted.
    pub async fn exec(mut self) -> Result<Vec<T>> {
        self.conditions.check()?;
        let mut rendered = Rendered::default();
        let filters: Vec<&Filter> = self.conditions.filters.iter().collect();
        rendered.expression = rendered.render(&filters);

        let model = self.model;
        let mut documents = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let result = model
                .client
                .scan()
                .table_name(&model.table_name)
                .set_filter_expression(rendered.expression.clone())
                .set_expression_attribute_names(rendered.names())
                .set_expression_attribute_values(rendered.values())
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(map_scan_error)?;

            for item in result.items.unwrap_or_default() {
                documents.push(model.decode(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(documents)
    }
}

/// A query under construction.
///
/// An equality filter on the hash key becomes the key condition; every
/// other filter is applied server-side after the key lookup.
pub struct Query<'m, T> {
    model: &'m Model<T>,
    conditions: Conditions,
}

impl<T: Document> Query<'_, T> {
    pub async fn exec(mut self) -> Result<Vec<T>> {
        self.conditions.check()?;
        let model = self.model;

        let (key, rest): (Vec<&Filter>, Vec<&Filter>) =
            self.conditions.filters.iter().partition(|filter| {
                filter.attribute == model.hash_key && filter.comparison == Comparison::Eq
            });
        if key.len() != 1 {
            return Err(HarnessError::RequestFailed(format!(
                "Query requires exactly one equality filter on hash key '{}'",
                model.hash_key
            )));
        }

        let mut rendered = Rendered::default();
        let key_condition = rendered.render(&key);
        rendered.expression = rendered.render(&rest);

        let mut documents = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let result = model
                .client
                .query()
                .table_name(&model.table_name)
                .set_key_condition_expression(key_condition.clone())
                .set_filter_expression(rendered.expression.clone())
                .set_expression_attribute_names(rendered.names())
                .set_expression_attribute_values(rendered.values())
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            for item in result.items.unwrap_or_default() {
                documents.push(model.decode(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(documents)
    }
}

/// Adapter driving a `Model<Record>`.
#[derive(Debug, Clone)]
pub struct ModelAdapter {
    model: Model<Record>,
}

impl ModelAdapter {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            model: Model::new(client, table_name, "id"),
        }
    }
}

#[async_trait]
impl Adapter for ModelAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn get_by_id(&self, id: &str) -> Result<Record> {
        self.model
            .get(id)
            .await?
            .ok_or_else(|| HarnessError::NotFound { id: id.to_string() })
    }

    async fn scan_filter(&self, predicate: &Predicate) -> Result<Vec<Record>> {
        let mut scan = self.model.scan();
        for condition in predicate.conditions() {
            let step = scan.filter(condition.field.attribute_name());
            scan = match condition.operator {
                Operator::Eq => step.eq(&condition.value),
                Operator::Gt => step.gt(&condition.value),
            };
        }
        scan.exec().await
    }

    async fn query_by_id(&self, id: &str) -> Result<Vec<Record>> {
        self.model.query().filter("id").eq(id).exec().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynabench_core::Scalar;

    #[test]
    fn test_render_numbers_placeholders_across_calls() {
        let key = Filter {
            attribute: "id".to_string(),
            comparison: Comparison::Eq,
            value: AttributeValue::S("abc".to_string()),
        };
        let rest = Filter {
            attribute: "number".to_string(),
            comparison: Comparison::Gt,
            value: AttributeValue::N("5".to_string()),
        };

        let mut rendered = Rendered::default();
        assert_eq!(rendered.render(&[&key]).as_deref(), Some("#a0 = :v0"));
        assert_eq!(rendered.render(&[&rest]).as_deref(), Some("#a1 > :v1"));
        assert_eq!(rendered.render(&[]), None);
        assert_eq!(rendered.names["#a1"], "number");
    }

    #[test]
    fn test_conditions_marshal_scalars() {
        let mut conditions = Conditions::default();
        conditions.push("number".to_string(), Comparison::Gt, Scalar::Number(10));
        conditions.push("string".to_string(), Comparison::Eq, Scalar::from("Lion"));

        assert!(conditions.check().is_ok());
        assert_eq!(
            conditions.filters[0].value,
            AttributeValue::N("10".to_string())
        );
        assert_eq!(
            conditions.filters[1].value,
            AttributeValue::S("Lion".to_string())
        );
    }

    /// Generated records with every varying field spread across its range.
    fn varied_records() -> Vec<Record> {
        let mut records = dynabench_core::dataset::generate(60);
        for (i, record) in records.iter_mut().enumerate() {
            record.boolean = i % 2 == 0;
            record.nullable = (i % 3 == 1).then(|| format!("value-{i}"));
            record.number_list = vec![-(i as i64), 0, i as i64 * 1_000_000];
        }
        records[0].number = 0;
        records[1].number = dynabench_core::dataset::NUMBER_BOUND - 1;
        records
    }

    #[test]
    fn test_generated_records_round_trip_through_serde_dynamo() {
        for record in varied_records() {
            let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record).unwrap();
            let decoded: Record = serde_dynamo::from_item(item).unwrap();
            assert_eq!(decoded.normalize(), record);
        }
    }

    #[test]
    fn test_items_written_by_native_conversion_decode() {
        for record in varied_records() {
            let item = crate::adapters::conversions::record_to_item(&record);
            let decoded: Record = serde_dynamo::from_item(item).unwrap();
            assert_eq!(decoded.normalize(), record);
        }
    }

    #[test]
    fn test_empty_nullable_is_normalized() {
        let mut record = dynabench_core::dataset::generate(1).remove(0);
        record.nullable = Some(String::new());
        assert_eq!(record.normalize().nullable, None);
    }
}
