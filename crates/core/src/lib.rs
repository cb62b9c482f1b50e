//! dynabench_core - harness logic shared by every adapter.
//!
//! Nothing in this crate talks to a backend: it generates the dataset,
//! describes the logical operations, checks results for equivalence and
//! times repeated calls through the [`Adapter`] trait.

pub mod adapter;
pub mod bench;
pub mod dataset;
pub mod error;
pub mod memory;
pub mod predicate;
pub mod record;
pub mod verify;

pub use adapter::{Adapter, Operation, OperationKind, SharedAdapter};
pub use bench::{BenchmarkRunner, Rounds, Timing};
pub use dataset::Dataset;
pub use error::{Divergence, HarnessError, Mismatch, Result};
pub use memory::InMemoryAdapter;
pub use predicate::{Condition, Operator, Predicate};
pub use record::{Field, Nested, Record, Scalar};
pub use verify::{Expectation, IdOrder, Normalization, Verification, Verifier};
