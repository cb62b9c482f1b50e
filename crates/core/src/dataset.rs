//! Synthetic dataset generation.
//!
//! The shape of every generated record is fixed; only `id`, `string` and
//! `number` vary. Generation draws from the thread-local random source, so
//! two calls produce different datasets.

use rand::Rng;
use uuid::Uuid;

use crate::predicate::Predicate;
use crate::record::{Nested, Record};

/// Categories `string` is drawn from.
pub const CATEGORIES: [&str; 3] = ["Lion", "Monkey", "Elephant"];

/// Exclusive upper bound of `number`.
pub const NUMBER_BOUND: u64 = 1_000_000;

/// Size of the reference dataset.
pub const DEFAULT_RECORD_COUNT: usize = 1_000;

/// The literal `externalIdList` shared by every record.
pub fn external_id_list() -> Vec<String> {
    vec![
        "some-external-id-1".to_string(),
        "some-external-id-2".to_string(),
        "some-external-id-3".to_string(),
    ]
}

/// Generates `count` records.
///
/// # Example
///
/// ```
/// use dynabench_core::dataset::generate;
///
/// let records = generate(10);
/// assert_eq!(records.len(), 10);
/// assert!(records.iter().all(|r| r.nullable.is_none()));
/// ```
pub fn generate(count: usize) -> Vec<Record> {
    let mut rng = rand::rng();

    (0..count)
        .map(|_| Record {
            id: Uuid::new_v4().to_string(),
            boolean: false,
            string: CATEGORIES[rng.random_range(0..CATEGORIES.len())].to_string(),
            nullable: None,
            number: rng.random_range(0..NUMBER_BOUND),
            external_id_list: external_id_list(),
            number_list: vec![1, 2, 3],
            nested: Nested::supported(true),
        })
        .collect()
}

/// The canonical dataset of a run, read-only once generated.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Generates a fresh dataset of `count` records.
    pub fn generate(count: usize) -> Self {
        Self::from_records(generate(count))
    }

    /// Wraps an existing set of records (useful for testing).
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// The record in the middle of the dataset.
    pub fn middle(&self) -> Option<&Record> {
        self.records.get(self.records.len() / 2)
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Records matching `predicate`, in generation order.
    pub fn filter(&self, predicate: &Predicate) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| predicate.matches(record))
            .cloned()
            .collect()
    }

    /// Records whose partition key equals `id`.
    pub fn query_by_id(&self, id: &str) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| record.id == id)
            .cloned()
            .collect()
    }
}
