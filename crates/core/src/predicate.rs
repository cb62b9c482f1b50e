//! Declarative scan predicates.
//!
//! A [`Predicate`] is a small expression tree over record fields. Adapters
//! compile it into their own filter representation; the in-memory
//! evaluation in [`Predicate::matches`] computes the expected result set.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Field, Record, Scalar};

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Gt,
}

impl Operator {
    /// The operator token in a DynamoDB condition expression.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
        }
    }
}

/// A `{field, operator, value}` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: Field,
    pub operator: Operator,
    pub value: Scalar,
}

/// Conjunction of conditions, possibly nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
    And(Vec<Predicate>),
    Compare(Condition),
}

impl Predicate {
    pub fn condition(field: Field, operator: Operator, value: impl Into<Scalar>) -> Self {
        Predicate::Compare(Condition {
            field,
            operator,
            value: value.into(),
        })
    }

    pub fn equals(field: Field, value: impl Into<Scalar>) -> Self {
        Self::condition(field, Operator::Eq, value)
    }

    pub fn greater_than(field: Field, value: impl Into<Scalar>) -> Self {
        Self::condition(field, Operator::Gt, value)
    }

    /// Combines `self` with `other`, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Self {
        let mut parts = match self {
            Predicate::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Predicate::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Predicate::And(parts)
    }

    /// Returns every leaf condition in left-to-right order.
    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Predicate::Compare(condition) => vec![condition],
            Predicate::And(parts) => parts.iter().flat_map(Predicate::conditions).collect(),
        }
    }

    /// Evaluates the predicate against an in-memory record.
    ///
    /// Comparisons between values of different types never match, which
    /// mirrors how DynamoDB treats `S` against `N`.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::And(parts) => parts.iter().all(|part| part.matches(record)),
            Predicate::Compare(condition) => {
                let Some(actual) = record.scalar(condition.field) else {
                    return false;
                };
                match compare_scalars(&actual, &condition.value) {
                    Some(ordering) => match condition.operator {
                        Operator::Eq => ordering == Ordering::Equal,
                        Operator::Gt => ordering == Ordering::Greater,
                    },
                    None => false,
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare(condition) => write!(
                f,
                "{} {} {}",
                condition.field,
                condition.operator.token(),
                condition.value
            ),
            Predicate::And(parts) => {
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" AND ")?;
                    }
                    match part {
                        Predicate::And(_) => write!(f, "({part})")?,
                        Predicate::Compare(_) => write!(f, "{part}")?,
                    }
                }
                Ok(())
            }
        }
    }
}

fn compare_scalars(left: &Scalar, right: &Scalar) -> Option<Ordering> {
    match (left, right) {
        (Scalar::Number(a), Scalar::Number(b)) => Some(a.cmp(b)),
        (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
        (Scalar::Bool(a), Scalar::Bool(b)) => (a == b).then_some(Ordering::Equal),
        _ => None,
    }
}
