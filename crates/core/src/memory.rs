//! In-memory adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::Adapter;
use crate::dataset::Dataset;
use crate::error::{HarnessError, Result};
use crate::predicate::Predicate;
use crate::record::Record;

/// Adapter answering straight from a [`Dataset`], without a backend.
///
/// Serves as a reference implementation and as a test double for the
/// verifier and the runner.
#[derive(Debug, Clone)]
pub struct InMemoryAdapter {
    name: String,
    dataset: Arc<Dataset>,
}

impl InMemoryAdapter {
    pub fn new(name: impl Into<String>, dataset: Arc<Dataset>) -> Self {
        Self {
            name: name.into(),
            dataset,
        }
    }
}

#[async_trait]
impl Adapter for InMemoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_by_id(&self, id: &str) -> Result<Record> {
        self.dataset
            .find(id)
            .cloned()
            .ok_or_else(|| HarnessError::NotFound { id: id.to_string() })
    }

    async fn scan_filter(&self, predicate: &Predicate) -> Result<Vec<Record>> {
        // Reverse generation order so callers cannot rely on it.
        let mut records = self.dataset.filter(predicate);
        records.reverse();
        Ok(records)
    }

    async fn query_by_id(&self, id: &str) -> Result<Vec<Record>> {
        Ok(self.dataset.query_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_record_is_not_found() {
        let adapter = InMemoryAdapter::new("memory", Arc::new(Dataset::generate(3)));

        let err = adapter.get_by_id("missing").await.unwrap_err();
        assert_eq!(
            err,
            HarnessError::NotFound {
                id: "missing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_get_existing_record() {
        let dataset = Arc::new(Dataset::generate(3));
        let adapter = InMemoryAdapter::new("memory", dataset.clone());
        let target = dataset.get(1).unwrap();

        assert_eq!(&adapter.get_by_id(&target.id).await.unwrap(), target);
    }
}
