use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::predicate::Predicate;
use crate::record::Record;

/// A client abstraction offering the logical operations of the harness.
///
/// Implementations perform their own marshalling and must normalize the
/// `nullable` attribute so that both `NULL` and `S("")` decode to `None`.
/// Every call round-trips to the backend.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short identifier used in reports and mismatch messages.
    fn name(&self) -> &str;

    /// Fetches exactly one record by primary key.
    async fn get_by_id(&self, id: &str) -> Result<Record>;

    /// Returns every record matching `predicate`, in backend order.
    async fn scan_filter(&self, predicate: &Predicate) -> Result<Vec<Record>>;

    /// Returns every record whose partition key equals `id`.
    async fn query_by_id(&self, id: &str) -> Result<Vec<Record>>;
}

pub type SharedAdapter = Arc<dyn Adapter>;

/// Kinds of logical operation, used to key per-kind configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Get,
    Scan,
    Query,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Get,
        OperationKind::Scan,
        OperationKind::Query,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Get => "get",
            OperationKind::Scan => "scan",
            OperationKind::Query => "query",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical operation with fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GetById(String),
    ScanFilter(Predicate),
    QueryById(String),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::GetById(_) => OperationKind::Get,
            Operation::ScanFilter(_) => OperationKind::Scan,
            Operation::QueryById(_) => OperationKind::Query,
        }
    }

    /// Runs the operation through `adapter`, returning records as a list.
    ///
    /// A point get yields a single-element list.
    pub async fn invoke(&self, adapter: &dyn Adapter) -> Result<Vec<Record>> {
        match self {
            Operation::GetById(id) => adapter.get_by_id(id).await.map(|record| vec![record]),
            Operation::ScanFilter(predicate) => adapter.scan_filter(predicate).await,
            Operation::QueryById(id) => adapter.query_by_id(id).await,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GetById(id) => write!(f, "get({id})"),
            Operation::ScanFilter(predicate) => write!(f, "scan({predicate})"),
            Operation::QueryById(id) => write!(f, "query(id = {id})"),
        }
    }
}
