//! Reference scenarios built from the generated dataset.

use dynabench_core::{
    Dataset, Expectation, Field, HarnessError, Normalization, Operation, OperationKind,
    Predicate, Record, Result,
};

/// One named workload: its operation and the result every adapter must
/// return.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: OperationKind,
    pub expectation: Expectation,
}

impl Scenario {
    pub fn new(operation: Operation, dataset: &Dataset) -> Self {
        Self {
            kind: operation.kind(),
            expectation: Expectation::from_dataset(operation, dataset),
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.expectation = self.expectation.with_normalization(normalization);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn operation(&self) -> &Operation {
        &self.expectation.operation
    }
}

/// Records in the same category as `anchor` with a larger `number`.
pub fn scan_predicate(anchor: &Record) -> Predicate {
    Predicate::equals(Field::String, anchor.string.as_str())
        .and(Predicate::greater_than(Field::Number, anchor.number))
}

/// The `get`, `scan` and `query` scenarios, in run order.
///
/// `get` targets the middle record, `scan` and `query` are anchored on the
/// first one. The query compares only its first record.
pub fn reference_scenarios(dataset: &Dataset) -> Result<Vec<Scenario>> {
    let (Some(first), Some(middle)) = (dataset.get(0), dataset.middle()) else {
        return Err(HarnessError::Fixture(
            "Scenarios need at least one record".to_string(),
        ));
    };

    Ok(vec![
        Scenario::new(Operation::GetById(middle.id.clone()), dataset),
        Scenario::new(Operation::ScanFilter(scan_predicate(first)), dataset),
        Scenario::new(Operation::QueryById(first.id.clone()), dataset)
            .with_normalization(Normalization::FirstOnly),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenarios() {
        let dataset = Dataset::generate(11);
        let scenarios = reference_scenarios(&dataset).unwrap();

        let names: Vec<_> = scenarios.iter().map(Scenario::name).collect();
        assert_eq!(names, vec!["get", "scan", "query"]);

        let first = dataset.get(0).unwrap();
        let middle = dataset.get(5).unwrap();

        assert_eq!(
            scenarios[0].operation(),
            &Operation::GetById(middle.id.clone())
        );
        assert_eq!(scenarios[0].expectation.expected, vec![middle.clone()]);

        assert!(scenarios[1]
            .expectation
            .expected
            .iter()
            .all(|r| r.string == first.string && r.number > first.number));
        assert!(matches!(
            scenarios[1].expectation.normalization,
            Normalization::SortById(_)
        ));

        assert_eq!(scenarios[2].expectation.expected, vec![first.clone()]);
        assert_eq!(
            scenarios[2].expectation.normalization,
            Normalization::FirstOnly
        );
    }

    #[test]
    fn test_scan_excludes_anchor() {
        let dataset = Dataset::generate(50);
        let first = dataset.get(0).unwrap();
        let matched = dataset.filter(&scan_predicate(first));
        assert!(matched.iter().all(|r| r.id != first.id));
    }

    #[test]
    fn test_empty_dataset_has_no_scenarios() {
        let result = reference_scenarios(&Dataset::generate(0));
        assert!(matches!(result, Err(HarnessError::Fixture(_))));
    }
}
