//! Benchmark table lifecycle.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client;
use dynabench_core::{HarnessError, Result};

use crate::error::{
    is_table_missing, map_create_table_error, map_delete_table_error, map_describe_table_error,
};

const MAX_ATTEMPTS: u32 = 60;
const POLL_DELAY: Duration = Duration::from_millis(100);

/// Declaration of the benchmark table: one string partition key and
/// provisioned capacity high enough to never throttle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table_name: String,
    pub partition_key: String,
    pub read_capacity: i64,
    pub write_capacity: i64,
}

impl TableSpec {
    pub const CAPACITY: i64 = 1_000_000;

    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: "id".to_string(),
            read_capacity: Self::CAPACITY,
            write_capacity: Self::CAPACITY,
        }
    }
}

fn build_error(e: impl std::fmt::Display) -> HarnessError {
    HarnessError::Fixture(e.to_string())
}

/// Fetches the table status, `None` when the table does not exist.
pub async fn table_status(client: &Client, table_name: &str) -> Result<Option<TableStatus>> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(response) => Ok(Some(
            response
                .table()
                .and_then(|table| table.table_status())
                .cloned()
                .unwrap_or(TableStatus::Active),
        )),
        Err(err) if is_table_missing(&err) => Ok(None),
        Err(err) => Err(map_describe_table_error(err)),
    }
}

pub async fn create_table(client: &Client, table: &TableSpec) -> Result<()> {
    let key_schema = KeySchemaElement::builder()
        .attribute_name(&table.partition_key)
        .key_type(KeyType::Hash)
        .build()
        .map_err(build_error)?;
    let attribute_definition = AttributeDefinition::builder()
        .attribute_name(&table.partition_key)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(build_error)?;
    let throughput = ProvisionedThroughput::builder()
        .read_capacity_units(table.read_capacity)
        .write_capacity_units(table.write_capacity)
        .build()
        .map_err(build_error)?;

    client
        .create_table()
        .table_name(&table.table_name)
        .key_schema(key_schema)
        .attribute_definitions(attribute_definition)
        .billing_mode(BillingMode::Provisioned)
        .provisioned_throughput(throughput)
        .send()
        .await
        .map_err(map_create_table_error)?;

    tracing::info!(table = %table.table_name, "Created table");
    Ok(())
}

pub async fn delete_table(client: &Client, table_name: &str) -> Result<()> {
    client
        .delete_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(map_delete_table_error)?;

    tracing::info!(table = %table_name, "Deleted table");
    Ok(())
}

/// Polls until the table reports `ACTIVE`.
pub async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    for _ in 0..MAX_ATTEMPTS {
        if table_status(client, table_name).await? == Some(TableStatus::Active) {
            return Ok(());
        }
        tokio::time::sleep(POLL_DELAY).await;
    }
    Err(HarnessError::Fixture(format!(
        "Table {table_name} did not become active"
    )))
}

/// Polls until the table no longer exists.
pub async fn wait_for_table_gone(client: &Client, table_name: &str) -> Result<()> {
    for _ in 0..MAX_ATTEMPTS {
        if table_status(client, table_name).await?.is_none() {
            return Ok(());
        }
        tokio::time::sleep(POLL_DELAY).await;
    }
    Err(HarnessError::Fixture(format!(
        "Table {table_name} was not deleted"
    )))
}

/// Drops any existing table of the same name and recreates it empty.
pub async fn reset_table(client: &Client, table: &TableSpec) -> Result<()> {
    if table_status(client, &table.table_name).await?.is_some() {
        delete_table(client, &table.table_name).await?;
        wait_for_table_gone(client, &table.table_name).await?;
    }
    create_table(client, table).await?;
    wait_for_table_active(client, &table.table_name).await
}
