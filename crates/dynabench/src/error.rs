//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `HarnessError` from `dynabench_core`. Transport
//! failures and timeouts become `BackendUnavailable` for every operation so
//! that an unreachable endpoint aborts the run.

use std::error::Error;
use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use dynabench_core::HarnessError;

/// Returns the harness error for failures that never reached the service.
fn transport_error<E, R>(err: &SdkError<E, R>) -> Option<HarnessError>
where
    E: Error + 'static,
    R: Debug,
{
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Some(
            HarnessError::BackendUnavailable(DisplayErrorContext(err).to_string()),
        ),
        SdkError::ResponseError(_) => {
            Some(HarnessError::Decode(DisplayErrorContext(err).to_string()))
        }
        SdkError::ConstructionFailure(_) => Some(HarnessError::RequestFailed(
            DisplayErrorContext(err).to_string(),
        )),
        _ => None,
    }
}

/// Map a GetItem SDK error to HarnessError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> HarnessError {
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            HarnessError::Fixture("Table not found".to_string())
        }
        GetItemError::InternalServerError(_) => {
            HarnessError::RequestFailed("DynamoDB internal server error".to_string())
        }
        err => HarnessError::RequestFailed(format!("GetItem failed: {}", DisplayErrorContext(err))),
    }
}

/// Map a Scan SDK error to HarnessError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(err: SdkError<ScanError, R>) -> HarnessError {
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => {
            HarnessError::Fixture("Table not found".to_string())
        }
        ScanError::InternalServerError(_) => {
            HarnessError::RequestFailed("DynamoDB internal server error".to_string())
        }
        err => HarnessError::RequestFailed(format!("Scan failed: {}", DisplayErrorContext(err))),
    }
}

/// Map a Query SDK error to HarnessError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> HarnessError {
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            HarnessError::Fixture("Table not found".to_string())
        }
        QueryError::InternalServerError(_) => {
            HarnessError::RequestFailed("DynamoDB internal server error".to_string())
        }
        err => HarnessError::RequestFailed(format!("Query failed: {}", DisplayErrorContext(err))),
    }
}

/// Whether a DescribeTable failure means the table does not exist.
pub fn is_table_missing<R>(err: &SdkError<DescribeTableError, R>) -> bool {
    err.as_service_error()
        .is_some_and(DescribeTableError::is_resource_not_found_exception)
}

/// Map a DescribeTable SDK error to HarnessError.
pub fn map_describe_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DescribeTableError, R>,
) -> HarnessError {
    if let Some(err) = transport_error(&err) {
        return err;
    }
    HarnessError::Fixture(format!(
        "DescribeTable failed: {}",
        DisplayErrorContext(err.into_service_error())
    ))
}

/// Map a CreateTable SDK error to HarnessError.
pub fn map_create_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<CreateTableError, R>,
) -> HarnessError {
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        CreateTableError::ResourceInUseException(_) => {
            HarnessError::Fixture("Table already exists".to_string())
        }
        err => HarnessError::Fixture(format!("CreateTable failed: {}", DisplayErrorContext(err))),
    }
}

/// Map a DeleteTable SDK error to HarnessError.
pub fn map_delete_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteTableError, R>,
) -> HarnessError {
    if let Some(err) = transport_error(&err) {
        return err;
    }
    HarnessError::Fixture(format!(
        "DeleteTable failed: {}",
        DisplayErrorContext(err.into_service_error())
    ))
}

/// Map a BatchWriteItem SDK error to HarnessError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
) -> HarnessError {
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(_) => {
            HarnessError::Fixture("Table not found".to_string())
        }
        err => HarnessError::Fixture(format!(
            "BatchWriteItem failed: {}",
            DisplayErrorContext(err)
        )),
    }
}

/// Map a serde_dynamo conversion error to HarnessError.
pub fn map_marshalling_error(err: serde_dynamo::Error) -> HarnessError {
    HarnessError::Decode(err.to_string())
}
