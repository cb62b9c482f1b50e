//! DynamoDB error envelopes.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type for mock backend operations.
pub type Result<T> = std::result::Result<T, MockError>;

/// Errors returned to clients, each mapped to a DynamoDB exception type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockError {
    #[error("Requested resource not found: Table: {0} not found")]
    ResourceNotFound(String),

    #[error("Table already exists: {0}")]
    ResourceInUse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{0}")]
    Serialization(String),
}

impl MockError {
    /// The exception name clients match on.
    pub fn error_type(&self) -> &'static str {
        match self {
            MockError::ResourceNotFound(_) => "ResourceNotFoundException",
            MockError::ResourceInUse(_) => "ResourceInUseException",
            MockError::Validation(_) => "ValidationException",
            MockError::UnknownOperation(_) => "UnknownOperationException",
            MockError::Serialization(_) => "SerializationException",
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        tracing::debug!(error_type = self.error_type(), error = %self, "Request rejected");

        let body = serde_json::json!({
            "__type": format!("com.amazonaws.dynamodb.v20120810#{}", self.error_type()),
            "message": self.to_string(),
        });

        (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, crate::server::CONTENT_TYPE)],
            body.to_string(),
        )
            .into_response()
    }
}
