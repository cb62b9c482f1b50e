use std::cmp::Ordering;

use super::{Comparator, Expression, Operand};
use crate::value::{AttributeValue, Item};

impl Operand {
    fn resolve<'a>(&'a self, item: &'a Item) -> Option<&'a AttributeValue> {
        match self {
            Operand::Attribute(name) => item.get(name),
            Operand::Value(value) => Some(value),
        }
    }
}

impl Expression {
    /// Evaluates the expression against `item`.
    ///
    /// Any comparison involving a missing attribute is false.
    pub fn evaluate(&self, item: &Item) -> bool {
        match self {
            Expression::Compare {
                left,
                comparator,
                right,
            } => {
                let (Some(left), Some(right)) = (left.resolve(item), right.resolve(item)) else {
                    return false;
                };
                match comparator {
                    Comparator::Eq => left.equals(right),
                    Comparator::Gt => left.compare(right) == Some(Ordering::Greater),
                }
            }
            Expression::And(left, right) => left.evaluate(item) && right.evaluate(item),
        }
    }
}
