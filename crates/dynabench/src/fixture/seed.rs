//! Dataset seeding.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use dynabench_core::{HarnessError, Record, Result};

use crate::adapters::conversions::record_to_item;
use crate::error::map_batch_write_error;

/// Largest batch `BatchWriteItem` accepts.
pub const BATCH_SIZE: usize = 25;

const MAX_UNPROCESSED_ATTEMPTS: u32 = 10;

/// Writes `records` in batches, resubmitting unprocessed items.
///
/// Returns the number of records written.
pub async fn seed_records(client: &Client, table_name: &str, records: &[Record]) -> Result<usize> {
    let mut inserted = 0;

    for chunk in records.chunks(BATCH_SIZE) {
        let write_requests = chunk
            .iter()
            .map(|record| {
                PutRequest::builder()
                    .set_item(Some(record_to_item(record)))
                    .build()
                    .map(|put| WriteRequest::builder().put_request(put).build())
                    .map_err(|e| HarnessError::Fixture(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut pending = HashMap::from([(table_name.to_string(), write_requests)]);
        let mut attempts = 0;
        while !pending.is_empty() {
            if attempts == MAX_UNPROCESSED_ATTEMPTS {
                return Err(HarnessError::Fixture(format!(
                    "Items left unprocessed after {attempts} attempts"
                )));
            }
            attempts += 1;

            let output = client
                .batch_write_item()
                .set_request_items(Some(pending))
                .send()
                .await
                .map_err(map_batch_write_error)?;

            pending = output
                .unprocessed_items
                .unwrap_or_default()
                .into_iter()
                .filter(|(_, requests)| !requests.is_empty())
                .collect();
        }

        inserted += chunk.len();
    }

    tracing::info!(table = %table_name, records = inserted, "Seeded table");
    Ok(inserted)
}
