//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and
//! records. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use dynabench_core::record::{AnyLevel, Level};
use dynabench_core::{Field, HarnessError, Nested, Record, Scalar};

pub type Item = HashMap<String, AttributeValue>;

/// Convert a Record to a DynamoDB item.
///
/// An absent `nullable` is written as `NULL`.
pub fn record_to_item(record: &Record) -> Item {
    let mut item = HashMap::new();

    item.insert("id".to_string(), AttributeValue::S(record.id.clone()));
    item.insert("boolean".to_string(), AttributeValue::Bool(record.boolean));
    item.insert("string".to_string(), AttributeValue::S(record.string.clone()));
    item.insert(
        "nullable".to_string(),
        match &record.nullable {
            Some(value) => AttributeValue::S(value.clone()),
            None => AttributeValue::Null(true),
        },
    );
    item.insert(
        "number".to_string(),
        AttributeValue::N(record.number.to_string()),
    );
    item.insert(
        "externalIdList".to_string(),
        AttributeValue::L(
            record
                .external_id_list
                .iter()
                .cloned()
                .map(AttributeValue::S)
                .collect(),
        ),
    );
    item.insert(
        "numberList".to_string(),
        AttributeValue::L(
            record
                .number_list
                .iter()
                .map(|n| AttributeValue::N(n.to_string()))
                .collect(),
        ),
    );
    item.insert("nested".to_string(), nested_to_attribute(&record.nested));

    item
}

/// Convert a DynamoDB item to a Record.
///
/// Attributes outside the record schema are rejected. `NULL`, `S("")` and
/// a missing `nullable` all decode to `None`.
pub fn item_to_record(item: &Item) -> Result<Record, HarnessError> {
    if let Some(unknown) = item
        .keys()
        .find(|name| Field::from_attribute_name(name).is_none())
    {
        return Err(HarnessError::Decode(format!(
            "Unexpected attribute: {unknown}"
        )));
    }

    Ok(Record {
        id: get_string(item, "id")?,
        boolean: get_bool(item, "boolean")?,
        string: get_string(item, "string")?,
        nullable: get_nullable_string(item, "nullable")?,
        number: get_number(item, "number")?,
        external_id_list: get_list(item, "externalIdList", |v| {
            v.as_s().map(|s| s.to_string()).ok()
        })?,
        number_list: get_list(item, "numberList", |v| {
            v.as_n().ok().and_then(|n| n.parse().ok())
        })?,
        nested: get_nested(item, "nested")?,
    })
}

/// Convert a predicate value to an attribute value.
pub fn scalar_to_attribute(value: &Scalar) -> AttributeValue {
    match value {
        Scalar::Bool(b) => AttributeValue::Bool(*b),
        Scalar::Number(n) => AttributeValue::N(n.to_string()),
        Scalar::String(s) => AttributeValue::S(s.clone()),
    }
}

fn nested_to_attribute(nested: &Nested) -> AttributeValue {
    let level = HashMap::from([(
        "supported".to_string(),
        AttributeValue::Bool(nested.any.level.supported),
    )]);
    let any = HashMap::from([("level".to_string(), AttributeValue::M(level))]);
    AttributeValue::M(HashMap::from([("any".to_string(), AttributeValue::M(any))]))
}

fn invalid(key: &str) -> HarnessError {
    HarnessError::Decode(format!("Missing or invalid field: {}", key))
}

/// Get a required string attribute.
fn get_string(item: &Item, key: &str) -> Result<String, HarnessError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| invalid(key))
}

/// Get a required boolean attribute.
fn get_bool(item: &Item, key: &str) -> Result<bool, HarnessError> {
    item.get(key)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .ok_or_else(|| invalid(key))
}

/// Get a required numeric attribute.
fn get_number<T: std::str::FromStr>(item: &Item, key: &str) -> Result<T, HarnessError> {
    let n = item
        .get(key)
        .and_then(|v| v.as_n().ok())
        .ok_or_else(|| invalid(key))?;
    n.parse()
        .map_err(|_| HarnessError::Decode(format!("Invalid number {}: {}", key, n)))
}

/// Get a string attribute that may be `NULL`, empty or missing.
fn get_nullable_string(item: &Item, key: &str) -> Result<Option<String>, HarnessError> {
    match item.get(key) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(s)) if s.is_empty() => Ok(None),
        Some(AttributeValue::S(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(key)),
    }
}

/// Get a required list attribute, converting each member with `convert`.
fn get_list<T>(
    item: &Item,
    key: &str,
    convert: impl Fn(&AttributeValue) -> Option<T>,
) -> Result<Vec<T>, HarnessError> {
    item.get(key)
        .and_then(|v| v.as_l().ok())
        .ok_or_else(|| invalid(key))?
        .iter()
        .map(|member| convert(member).ok_or_else(|| invalid(key)))
        .collect()
}

/// Get the `nested.any.level.supported` structure.
fn get_nested(item: &Item, key: &str) -> Result<Nested, HarnessError> {
    let nested = item
        .get(key)
        .and_then(|v| v.as_m().ok())
        .ok_or_else(|| invalid(key))?;
    let any = nested
        .get("any")
        .and_then(|v| v.as_m().ok())
        .ok_or_else(|| invalid("nested.any"))?;
    let level = any
        .get("level")
        .and_then(|v| v.as_m().ok())
        .ok_or_else(|| invalid("nested.any.level"))?;
    let supported =
        get_bool(level, "supported").map_err(|_| invalid("nested.any.level.supported"))?;

    Ok(Nested {
        any: AnyLevel {
            level: Level { supported },
        },
    })
}
