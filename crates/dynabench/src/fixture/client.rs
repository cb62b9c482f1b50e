//! AWS SDK client setup.

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;

use crate::config::Config;

/// Creates a DynamoDB client pointed at `endpoint`.
///
/// Credentials are static because the backend is local. Retries are
/// disabled and every operation shares the configured timeout.
pub async fn create_client(config: &Config, endpoint: &str) -> Client {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .endpoint_url(endpoint)
        .credentials_provider(Credentials::new(
            "local",
            "local",
            None,
            None,
            "dynabench",
        ))
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.timeout)
                .build(),
        )
        .retry_config(RetryConfig::disabled())
        .load()
        .await;

    tracing::debug!(endpoint, region = %config.region, "Created DynamoDB client");
    Client::new(&sdk_config)
}
