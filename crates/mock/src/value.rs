//! DynamoDB JSON attribute values.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An attribute value in DynamoDB JSON form, e.g. `{"S": "Lion"}`.
///
/// Numbers travel as strings and are compared numerically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
}

/// A stored item.
pub type Item = HashMap<String, AttributeValue>;

impl AttributeValue {
    /// The DynamoDB type descriptor.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
        }
    }

    /// Orders two values of the same scalar type.
    ///
    /// Returns `None` for mismatched types and for types without an order.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
            (AttributeValue::N(a), AttributeValue::N(b)) => {
                let a = a.parse::<f64>().ok()?;
                let b = b.parse::<f64>().ok()?;
                a.partial_cmp(&b)
            }
            _ => None,
        }
    }

    /// Equality with numeric semantics for `N`.
    pub fn equals(&self, other: &AttributeValue) -> bool {
        match (self, other) {
            (AttributeValue::N(_), AttributeValue::N(_)) => {
                self.compare(other) == Some(Ordering::Equal)
            }
            _ => self == other,
        }
    }

    /// Checks number literals recursively.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            AttributeValue::N(n) => parse_number(n),
            AttributeValue::L(values) => values.iter().try_for_each(AttributeValue::validate),
            AttributeValue::M(map) => map.values().try_for_each(AttributeValue::validate),
            _ => Ok(()),
        }
    }
}

fn parse_number(n: &str) -> Result<(), String> {
    n.trim()
        .parse::<f64>()
        .map(|_| ())
        .map_err(|_| format!("The parameter cannot be converted to a numeric value: {n}"))
}
