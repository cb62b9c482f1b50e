//! Cross-adapter equivalence checks.
//!
//! The expected result of an operation is computed from the in-memory
//! dataset. Each adapter's result is normalized the same way as the
//! expected result and compared record by record, field by field.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::adapter::{Operation, SharedAdapter};
use crate::dataset::Dataset;
use crate::error::{Divergence, Mismatch, Result};
use crate::record::Record;

/// Total order on `id` used to normalize unordered results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdOrder {
    Ascending,
    #[default]
    Descending,
}

impl IdOrder {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            IdOrder::Ascending => a.id.cmp(&b.id),
            IdOrder::Descending => b.id.cmp(&a.id),
        }
    }
}

/// How results are normalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Normalization {
    /// Compare the full sequence in the order returned.
    AsReturned,
    /// Sort both sides by `id` before comparing.
    SortById(IdOrder),
    /// Compare only the first record of each side.
    FirstOnly,
}

impl Normalization {
    pub fn apply(&self, mut records: Vec<Record>) -> Vec<Record> {
        match self {
            Normalization::AsReturned => records,
            Normalization::SortById(order) => {
                records.sort_by(|a, b| order.compare(a, b));
                records
            }
            Normalization::FirstOnly => {
                records.truncate(1);
                records
            }
        }
    }
}

/// An operation paired with its independently computed result.
#[derive(Debug, Clone)]
pub struct Expectation {
    pub operation: Operation,
    pub expected: Vec<Record>,
    pub normalization: Normalization,
}

impl Expectation {
    /// Computes the expected result of `operation` from `dataset`.
    ///
    /// Scans are normalized by sorting on `id` descending; gets and
    /// queries keep the returned order.
    pub fn from_dataset(operation: Operation, dataset: &Dataset) -> Self {
        let (expected, normalization) = match &operation {
            Operation::GetById(id) => (
                dataset.find(id).cloned().into_iter().collect(),
                Normalization::AsReturned,
            ),
            Operation::ScanFilter(predicate) => (
                dataset.filter(predicate),
                Normalization::SortById(IdOrder::default()),
            ),
            Operation::QueryById(id) => (dataset.query_by_id(id), Normalization::AsReturned),
        };

        Self {
            operation,
            expected,
            normalization,
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }
}

/// Compares `actual` against `expected` after normalizing both.
pub fn compare(
    adapter: &str,
    operation: &Operation,
    expected: &[Record],
    actual: Vec<Record>,
    normalization: Normalization,
) -> std::result::Result<(), Mismatch> {
    let expected = normalization.apply(expected.to_vec());
    let actual = normalization.apply(actual);

    let mismatch = |divergence| Mismatch {
        adapter: adapter.to_string(),
        operation: operation.to_string(),
        divergence,
    };

    if expected.len() != actual.len() {
        return Err(mismatch(Divergence::Length {
            expected: expected.len(),
            actual: actual.len(),
        }));
    }

    for (index, (want, got)) in expected.iter().zip(&actual).enumerate() {
        if want.id != got.id {
            return Err(mismatch(Divergence::Identity {
                index,
                expected_id: want.id.clone(),
                actual_id: got.id.clone(),
            }));
        }
        if let Some(field) = want.diff(got).into_iter().next() {
            return Err(mismatch(Divergence::Field {
                index,
                id: want.id.clone(),
                field,
                expected: want.render_field(field),
                actual: got.render_field(field),
            }));
        }
    }

    Ok(())
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub operation: String,
    pub adapters: Vec<String>,
    pub records: usize,
}

/// Runs operations through every adapter and checks the results agree
/// with the expected result.
pub struct Verifier {
    adapters: Vec<SharedAdapter>,
}

impl Verifier {
    pub fn new(adapters: Vec<SharedAdapter>) -> Self {
        Self { adapters }
    }

    pub fn adapters(&self) -> &[SharedAdapter] {
        &self.adapters
    }

    /// Verifies every adapter in order, stopping at the first failure.
    pub async fn verify(&self, expectation: &Expectation) -> Result<Verification> {
        let operation = &expectation.operation;
        let mut verified = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            tracing::debug!(adapter = adapter.name(), %operation, "Verifying adapter");

            let actual = operation.invoke(adapter.as_ref()).await?;
            compare(
                adapter.name(),
                operation,
                &expectation.expected,
                actual,
                expectation.normalization,
            )?;

            verified.push(adapter.name().to_string());
        }

        Ok(Verification {
            operation: operation.to_string(),
            adapters: verified,
            records: expectation.expected.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::adapter::Adapter;
    use crate::error::HarnessError;
    use crate::memory::InMemoryAdapter;
    use crate::predicate::Predicate;
    use crate::record::Field;

    /// Adapter that decodes `nullable` as an empty string instead of `None`.
    struct EmptyStringAdapter(InMemoryAdapter);

    #[async_trait]
    impl Adapter for EmptyStringAdapter {
        fn name(&self) -> &str {
            "empty-string"
        }

        async fn get_by_id(&self, id: &str) -> Result<Record> {
            let mut record = self.0.get_by_id(id).await?;
            record.nullable = Some(String::new());
            Ok(record)
        }

        async fn scan_filter(&self, predicate: &Predicate) -> Result<Vec<Record>> {
            let mut records = self.0.scan_filter(predicate).await?;
            records.pop();
            Ok(records)
        }

        async fn query_by_id(&self, id: &str) -> Result<Vec<Record>> {
            self.0.query_by_id(id).await
        }
    }

    fn scan_predicate(dataset: &Dataset) -> Predicate {
        let first = dataset.get(0).unwrap();
        Predicate::equals(Field::String, first.string.as_str())
            .and(Predicate::greater_than(Field::Number, 0u64))
    }

    fn record(id: &str) -> Record {
        let mut record = crate::dataset::generate(1).remove(0);
        record.id = id.to_string();
        record
    }

    #[test]
    fn test_sort_by_id_descending() {
        let records = vec![record("b"), record("c"), record("a")];
        let sorted = Normalization::SortById(IdOrder::Descending).apply(records);
        let ids: Vec<_> = sorted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_first_only_truncates() {
        let records = vec![record("b"), record("a")];
        let first = Normalization::FirstOnly.apply(records);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "b");
    }

    #[test]
    fn test_compare_ignores_order_when_sorting() {
        let a = record("a");
        let b = record("b");
        let operation = Operation::ScanFilter(Predicate::equals(Field::Boolean, false));

        let result = compare(
            "native",
            &operation,
            &[a.clone(), b.clone()],
            vec![b, a],
            Normalization::SortById(IdOrder::Ascending),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_compare_reports_identity_divergence_in_returned_order() {
        let a = record("a");
        let b = record("b");
        let operation = Operation::QueryById("a".to_string());

        let mismatch = compare(
            "native",
            &operation,
            &[a.clone(), b.clone()],
            vec![b, a],
            Normalization::AsReturned,
        )
        .unwrap_err();

        assert_eq!(
            mismatch.divergence,
            Divergence::Identity {
                index: 0,
                expected_id: "a".to_string(),
                actual_id: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_compare_reports_field_divergence() {
        let expected = record("a");
        let mut actual = expected.clone();
        actual.number_list = vec![3, 2, 1];

        let mismatch = compare(
            "model",
            &Operation::GetById("a".to_string()),
            &[expected],
            vec![actual],
            Normalization::AsReturned,
        )
        .unwrap_err();

        assert_eq!(mismatch.adapter, "model");
        assert!(matches!(
            mismatch.divergence,
            Divergence::Field {
                field: Field::NumberList,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_verify_passes_for_agreeing_adapters() {
        let dataset = Arc::new(Dataset::generate(200));
        let verifier = Verifier::new(vec![
            Arc::new(InMemoryAdapter::new("first", dataset.clone())),
            Arc::new(InMemoryAdapter::new("second", dataset.clone())),
        ]);

        let target = dataset.middle().unwrap().id.clone();
        for operation in [
            Operation::GetById(target.clone()),
            Operation::ScanFilter(scan_predicate(&dataset)),
            Operation::QueryById(target),
        ] {
            let expectation = Expectation::from_dataset(operation, &dataset);
            let verification = verifier.verify(&expectation).await.unwrap();
            assert_eq!(verification.adapters, vec!["first", "second"]);
        }
    }

    #[tokio::test]
    async fn test_verify_detects_nullable_representation() {
        let dataset = Arc::new(Dataset::generate(10));
        let verifier = Verifier::new(vec![
            Arc::new(InMemoryAdapter::new("memory", dataset.clone())),
            Arc::new(EmptyStringAdapter(InMemoryAdapter::new(
                "inner",
                dataset.clone(),
            ))),
        ]);

        let target = dataset.get(0).unwrap().id.clone();
        let expectation = Expectation::from_dataset(Operation::GetById(target), &dataset);

        match verifier.verify(&expectation).await {
            Err(HarnessError::EquivalenceMismatch(mismatch)) => {
                assert_eq!(mismatch.adapter, "empty-string");
                assert!(matches!(
                    mismatch.divergence,
                    Divergence::Field {
                        field: Field::Nullable,
                        ..
                    }
                ));
            }
            other => panic!("expected a mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_detects_missing_scan_results() {
        let dataset = Arc::new(Dataset::generate(200));
        let verifier = Verifier::new(vec![Arc::new(EmptyStringAdapter(
            InMemoryAdapter::new("inner", dataset.clone()),
        ))]);

        let expectation =
            Expectation::from_dataset(Operation::ScanFilter(scan_predicate(&dataset)), &dataset);
        let expected_len = expectation.expected.len();

        match verifier.verify(&expectation).await {
            Err(HarnessError::EquivalenceMismatch(mismatch)) => {
                assert_eq!(
                    mismatch.divergence,
                    Divergence::Length {
                        expected: expected_len,
                        actual: expected_len - 1,
                    }
                );
            }
            other => panic!("expected a mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_propagates_not_found() {
        let dataset = Arc::new(Dataset::generate(3));
        let verifier = Verifier::new(vec![Arc::new(InMemoryAdapter::new(
            "memory",
            dataset.clone(),
        ))]);

        let expectation =
            Expectation::from_dataset(Operation::GetById("missing".to_string()), &dataset);

        assert!(matches!(
            verifier.verify(&expectation).await,
            Err(HarnessError::NotFound { .. })
        ));
    }
}
