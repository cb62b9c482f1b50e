//! Client adapters over `aws-sdk-dynamodb`.
//!
//! Each adapter reaches the backend its own way:
//! - [`native`]: hand-built requests and attribute conversions
//! - [`model`]: a serde object model with a fluent condition builder
//! - [`mapper`]: a schema-declared data mapper

pub mod conversions;
pub mod mapper;
pub mod model;
pub mod native;

use std::sync::Arc;

use aws_sdk_dynamodb::Client;
use dynabench_core::SharedAdapter;

pub use mapper::DataMapperAdapter;
pub use model::ModelAdapter;
pub use native::NativeSdkAdapter;

/// Builds every adapter over `client`, in report order.
pub fn all(client: &Client, table_name: &str) -> Vec<SharedAdapter> {
    vec![
        Arc::new(NativeSdkAdapter::new(client.clone(), table_name)),
        Arc::new(ModelAdapter::new(client.clone(), table_name)),
        Arc::new(DataMapperAdapter::new(client.clone(), table_name)),
    ]
}
