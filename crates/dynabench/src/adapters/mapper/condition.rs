//! Condition trees and their serialization into expression strings.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use dynabench_core::HarnessError;
use serde_json::Value;

use super::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equals,
    GreaterThan,
}

impl ComparisonOperator {
    fn token(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "=",
            ComparisonOperator::GreaterThan => ">",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpression {
    And(Vec<ConditionExpression>),
    Comparison {
        subject: String,
        operator: ComparisonOperator,
        value: Value,
    },
}

impl ConditionExpression {
    /// True when the tree holds no comparison.
    pub fn is_empty(&self) -> bool {
        match self {
            ConditionExpression::And(conditions) => {
                conditions.iter().all(ConditionExpression::is_empty)
            }
            ConditionExpression::Comparison { .. } => false,
        }
    }
}

pub fn equals(subject: impl Into<String>, value: impl Into<Value>) -> ConditionExpression {
    ConditionExpression::Comparison {
        subject: subject.into(),
        operator: ComparisonOperator::Equals,
        value: value.into(),
    }
}

pub fn greater_than(subject: impl Into<String>, value: impl Into<Value>) -> ConditionExpression {
    ConditionExpression::Comparison {
        subject: subject.into(),
        operator: ComparisonOperator::GreaterThan,
        value: value.into(),
    }
}

/// Name and value placeholders shared by the expressions of one request.
///
/// Names get `#attrN` and values `:valN` from a single counter, and a name
/// used twice reuses its placeholder.
#[derive(Debug, Default)]
pub struct ExpressionAttributes {
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
    counter: usize,
}

impl ExpressionAttributes {
    pub fn add_name(&mut self, name: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, n)| n.as_str() == name) {
            return placeholder.clone();
        }
        let placeholder = format!("#attr{}", self.counter);
        self.counter += 1;
        self.names.insert(placeholder.clone(), name.to_string());
        placeholder
    }

    pub fn add_value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":val{}", self.counter);
        self.counter += 1;
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    /// Serializes `condition`, marshalling operands through `schema`.
    pub fn serialize(
        &mut self,
        condition: &ConditionExpression,
        schema: &Schema,
    ) -> Result<String, HarnessError> {
        match condition {
            ConditionExpression::And(conditions) => {
                let parts = conditions
                    .iter()
                    .filter(|condition| !condition.is_empty())
                    .map(|condition| match condition {
                        ConditionExpression::And(_) => {
                            Ok(format!("({})", self.serialize(condition, schema)?))
                        }
                        _ => self.serialize(condition, schema),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(parts.join(" AND "))
            }
            ConditionExpression::Comparison {
                subject,
                operator,
                value,
            } => {
                let name = self.add_name(subject);
                let value = self.add_value(schema.marshall_value(subject, value)?);
                Ok(format!("{name} {} {value}", operator.token()))
            }
        }
    }

    pub fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    pub fn values(&self) -> Option<HashMap<String, AttributeValue>> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}
