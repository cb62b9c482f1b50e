//! Condition expressions.
//!
//! Parses the subset of the expression grammar the adapters send as
//! `FilterExpression` and `KeyConditionExpression`: `=` and `>`
//! comparisons joined by `AND`, optionally parenthesized. `#name` and
//! `:value` placeholders are resolved at parse time.

mod eval;
mod parser;

pub use parser::Placeholders;

use crate::value::AttributeValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A top-level attribute name.
    Attribute(String),
    Value(AttributeValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Compare {
        left: Operand,
        comparator: Comparator,
        right: Operand,
    },
    And(Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Finds the value `attribute` is required to equal.
    pub fn equality_on(&self, attribute: &str) -> Option<&AttributeValue> {
        match self {
            Expression::Compare {
                left,
                comparator: Comparator::Eq,
                right,
            } => match (left, right) {
                (Operand::Attribute(name), Operand::Value(value))
                | (Operand::Value(value), Operand::Attribute(name))
                    if name == attribute =>
                {
                    Some(value)
                }
                _ => None,
            },
            Expression::Compare { .. } => None,
            Expression::And(left, right) => left
                .equality_on(attribute)
                .or_else(|| right.equality_on(attribute)),
        }
    }
}
