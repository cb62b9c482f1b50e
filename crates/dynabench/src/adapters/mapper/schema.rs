//! Schema-driven marshalling between documents and items.
//!
//! Documents are JSON values; every attribute is converted according to
//! the [`SchemaType`] declared for it.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use dynabench_core::HarnessError;
use serde_json::{Map, Number, Value};

/// Converts one attribute in both directions.
#[derive(Clone, Copy)]
pub struct CustomType {
    pub marshall: fn(&Value) -> Result<AttributeValue, HarnessError>,
    pub unmarshall: fn(&AttributeValue) -> Result<Value, HarnessError>,
}

impl std::fmt::Debug for CustomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CustomType")
    }
}

#[derive(Debug, Clone)]
pub enum SchemaType {
    String,
    Boolean,
    Number,
    List(Box<SchemaType>),
    /// Marshalled by inspecting the value itself.
    Any,
    Custom(CustomType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Hash,
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: SchemaType,
    pub key_type: Option<KeyType>,
}

/// Attribute declarations of one mapped table.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn hash_key(&self) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|field| field.key_type == Some(KeyType::Hash))
    }

    /// Marshalls a document. Attributes without a declaration are dropped.
    pub fn marshall_item(
        &self,
        document: &Map<String, Value>,
    ) -> Result<HashMap<String, AttributeValue>, HarnessError> {
        let mut item = HashMap::new();
        for field in &self.fields {
            if let Some(value) = document.get(field.name) {
                item.insert(field.name.to_string(), marshall(&field.kind, value)?);
            }
        }
        Ok(item)
    }

    /// Unmarshalls an item. Attributes without a declaration are an error.
    pub fn unmarshall_item(
        &self,
        item: &HashMap<String, AttributeValue>,
    ) -> Result<Map<String, Value>, HarnessError> {
        let mut document = Map::new();
        for (name, value) in item {
            let field = self.field(name).ok_or_else(|| {
                HarnessError::Decode(format!("Attribute '{name}' is not declared in the schema"))
            })?;
            document.insert(name.clone(), unmarshall(&field.kind, value)?);
        }
        Ok(document)
    }

    /// Marshalls a condition operand for the attribute `subject`.
    pub fn marshall_value(
        &self,
        subject: &str,
        value: &Value,
    ) -> Result<AttributeValue, HarnessError> {
        match self.field(subject) {
            Some(field) => marshall(&field.kind, value),
            None => marshall(&SchemaType::Any, value),
        }
    }
}

fn mismatch(expected: &str, value: &impl std::fmt::Debug) -> HarnessError {
    HarnessError::Decode(format!("Expected {expected}, found {value:?}"))
}

pub fn marshall(kind: &SchemaType, value: &Value) -> Result<AttributeValue, HarnessError> {
    match (kind, value) {
        (SchemaType::Custom(custom), value) => (custom.marshall)(value),
        (SchemaType::String, Value::String(s)) => Ok(AttributeValue::S(s.clone())),
        (SchemaType::Boolean, Value::Bool(b)) => Ok(AttributeValue::Bool(*b)),
        (SchemaType::Number, Value::Number(n)) => Ok(AttributeValue::N(n.to_string())),
        (SchemaType::List(member), Value::Array(values)) => values
            .iter()
            .map(|value| marshall(member, value))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::L),
        (SchemaType::Any, value) => Ok(marshall_any(value)),
        (SchemaType::String, value) => Err(mismatch("string", value)),
        (SchemaType::Boolean, value) => Err(mismatch("boolean", value)),
        (SchemaType::Number, value) => Err(mismatch("number", value)),
        (SchemaType::List(_), value) => Err(mismatch("list", value)),
    }
}

pub fn unmarshall(kind: &SchemaType, value: &AttributeValue) -> Result<Value, HarnessError> {
    match (kind, value) {
        (SchemaType::Custom(custom), value) => (custom.unmarshall)(value),
        (SchemaType::String, AttributeValue::S(s)) => Ok(Value::String(s.clone())),
        (SchemaType::Boolean, AttributeValue::Bool(b)) => Ok(Value::Bool(*b)),
        (SchemaType::Number, AttributeValue::N(n)) => parse_number(n),
        (SchemaType::List(member), AttributeValue::L(values)) => values
            .iter()
            .map(|value| unmarshall(member, value))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (SchemaType::Any, value) => unmarshall_any(value),
        (SchemaType::String, value) => Err(mismatch("S", value)),
        (SchemaType::Boolean, value) => Err(mismatch("BOOL", value)),
        (SchemaType::Number, value) => Err(mismatch("N", value)),
        (SchemaType::List(_), value) => Err(mismatch("L", value)),
    }
}

fn marshall_any(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(marshall_any).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(key, value)| (key.clone(), marshall_any(value)))
                .collect(),
        ),
    }
}

fn unmarshall_any(value: &AttributeValue) -> Result<Value, HarnessError> {
    Ok(match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(unmarshall_any)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(key, value)| Ok((key.clone(), unmarshall_any(value)?)))
                .collect::<Result<Map<_, _>, HarnessError>>()?,
        ),
        other => return Err(mismatch("a document type", other)),
    })
}

fn parse_number(n: &str) -> Result<Value, HarnessError> {
    let number = if let Ok(i) = n.parse::<i64>() {
        Number::from(i)
    } else if let Ok(u) = n.parse::<u64>() {
        Number::from(u)
    } else {
        n.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| HarnessError::Decode(format!("Invalid number: {n}")))?
    };
    Ok(Value::Number(number))
}
