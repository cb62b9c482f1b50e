//! In-process DynamoDB-compatible endpoint.
//!
//! Serves a subset of the DynamoDB JSON protocol from memory so the
//! benchmark adapters can run against a real SDK client without an
//! external database:
//!
//! ```no_run
//! use dynabench_mock::{MockDynamoServer, MockStore};
//!
//! # async fn start() -> std::io::Result<()> {
//! let server = MockDynamoServer::start(([127, 0, 0, 1], 0).into(), MockStore::new()).await?;
//! println!("endpoint: {}", server.endpoint());
//! server.shutdown().await
//! # }
//! ```

pub mod error;
pub mod expression;
pub mod protocol;
pub mod server;
pub mod store;
pub mod value;

pub use error::{MockError, Result};
pub use server::{router, MockDynamoServer, RunningServer};
pub use store::MockStore;
pub use value::{AttributeValue, Item};
