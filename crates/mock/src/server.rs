//! HTTP front end speaking the DynamoDB JSON 1.0 protocol.
//!
//! Every operation is a `POST /` whose `X-Amz-Target` header names it, e.g.
//! `DynamoDB_20120810.Scan`. Request signatures are not checked.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower_http::trace::TraceLayer;

use crate::error::{MockError, Result};
use crate::protocol::{
    BatchWriteItemInput, CreateTableInput, GetItemInput, QueryInput, ScanInput, TableNameInput,
};
use crate::store::MockStore;

pub const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

const TARGET_HEADER: &str = "x-amz-target";
const TARGET_PREFIX: &str = "DynamoDB_20120810.";

/// Builds the router serving `store`.
pub fn router(store: MockStore) -> Router {
    Router::new()
        .route("/", post(dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn dispatch(State(store): State<MockStore>, headers: HeaderMap, body: Bytes) -> Response {
    match handle(&store, &headers, &body).await {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body.to_string()).into_response(),
        Err(error) => error.into_response(),
    }
}

async fn handle(store: &MockStore, headers: &HeaderMap, body: &[u8]) -> Result<Value> {
    let target = headers
        .get(TARGET_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let operation = target
        .strip_prefix(TARGET_PREFIX)
        .ok_or_else(|| MockError::UnknownOperation(target.to_string()))?;

    tracing::trace!(operation, "Handling request");

    let response = match operation {
        "CreateTable" => {
            let description = store.create_table(parse::<CreateTableInput>(body)?).await?;
            json!({ "TableDescription": description })
        }
        "DescribeTable" => {
            let input = parse::<TableNameInput>(body)?;
            json!({ "Table": store.describe_table(&input.table_name).await? })
        }
        "DeleteTable" => {
            let input = parse::<TableNameInput>(body)?;
            json!({ "TableDescription": store.delete_table(&input.table_name).await? })
        }
        "GetItem" => match store.get_item(parse::<GetItemInput>(body)?).await? {
            Some(item) => json!({ "Item": item }),
            None => json!({}),
        },
        "BatchWriteItem" => {
            store
                .batch_write_item(parse::<BatchWriteItemInput>(body)?)
                .await?;
            json!({ "UnprocessedItems": {} })
        }
        "Scan" => to_value(store.scan(parse::<ScanInput>(body)?).await?)?,
        "Query" => to_value(store.query(parse::<QueryInput>(body)?).await?)?,
        other => return Err(MockError::UnknownOperation(other.to_string())),
    };

    Ok(response)
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| MockError::Serialization(e.to_string()))
}

fn to_value(value: impl serde::Serialize) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| MockError::Serialization(e.to_string()))
}

/// Entry point for starting the mock endpoint.
pub struct MockDynamoServer;

impl MockDynamoServer {
    /// Binds `addr` (port 0 picks a free port) and serves `store` on a
    /// spawned task.
    pub async fn start(addr: SocketAddr, store: MockStore) -> std::io::Result<RunningServer> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = router(store);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!("Mock DynamoDB listening on http://{}", local_addr);

        Ok(RunningServer {
            addr: local_addr,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }
}

/// Handle to a running mock endpoint. Dropping it stops the server.
pub struct RunningServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL clients use as their endpoint override.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(mut self) -> std::io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.await.map_err(std::io::Error::other)?,
            None => Ok(()),
        }?;
        tracing::info!(addr = %self.addr, "Mock DynamoDB stopped");
        Ok(())
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn start() -> RunningServer {
        MockDynamoServer::start(SocketAddr::from(([127, 0, 0, 1], 0)), MockStore::new())
            .await
            .unwrap()
    }

    async fn call(server: &RunningServer, operation: &str, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(server.endpoint())
            .header(TARGET_HEADER, format!("{TARGET_PREFIX}{operation}"))
            .header(header::CONTENT_TYPE.as_str(), CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }

    fn create_table_body() -> Value {
        json!({
            "TableName": "LargeItem",
            "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
            "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
            "ProvisionedThroughput": {"ReadCapacityUnits": 1000000, "WriteCapacityUnits": 1000000}
        })
    }

    #[tokio::test]
    async fn test_binds_ephemeral_port() {
        let server = start().await;
        assert_ne!(server.addr().port(), 0);
        assert!(server.endpoint().starts_with("http://127.0.0.1:"));
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_write_get_round_trip() {
        let server = start().await;

        let response = call(&server, "CreateTable", create_table_body()).await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["TableDescription"]["TableStatus"], "ACTIVE");

        let response = call(
            &server,
            "BatchWriteItem",
            json!({"RequestItems": {"LargeItem": [
                {"PutRequest": {"Item": {"id": {"S": "abc"}, "number": {"N": "7"}}}}
            ]}}),
        )
        .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"UnprocessedItems": {}}));

        let body: Value = call(
            &server,
            "GetItem",
            json!({"TableName": "LargeItem", "Key": {"id": {"S": "abc"}}}),
        )
        .await
        .json()
        .await
        .unwrap();
        assert_eq!(body["Item"]["number"]["N"], "7");

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_item_has_no_item_member() {
        let server = start().await;
        call(&server, "CreateTable", create_table_body()).await;

        let body: Value = call(
            &server,
            "GetItem",
            json!({"TableName": "LargeItem", "Key": {"id": {"S": "nope"}}}),
        )
        .await
        .json()
        .await
        .unwrap();
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_errors_use_dynamodb_envelope() {
        let server = start().await;

        let response = call(&server, "Scan", json!({"TableName": "Missing"})).await;
        assert_eq!(response.status(), 400);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE.as_str()],
            CONTENT_TYPE
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException"
        );
    }

    #[tokio::test]
    async fn test_unsupported_operations_are_unknown() {
        let server = start().await;
        for operation in ["UpdateTimeToLive", "PutItem", "ListTables", "UpdateItem"] {
            let body: Value = call(&server, operation, json!({}))
                .await
                .json()
                .await
                .unwrap();
            assert_eq!(
                body["__type"],
                "com.amazonaws.dynamodb.v20120810#UnknownOperationException",
                "{operation}"
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_serialization_error() {
        let server = start().await;
        let response = reqwest::Client::new()
            .post(server.endpoint())
            .header(TARGET_HEADER, "DynamoDB_20120810.Scan")
            .body("{not json")
            .send()
            .await
            .unwrap();
        let body: Value = response.json().await.unwrap();
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#SerializationException"
        );
    }

    #[tokio::test]
    async fn test_shutdown_refuses_new_connections() {
        let server = start().await;
        let endpoint = server.endpoint();
        server.shutdown().await.unwrap();

        let result = reqwest::Client::new()
            .post(endpoint)
            .header(TARGET_HEADER, "DynamoDB_20120810.DescribeTable")
            .body(r#"{"TableName": "LargeItem"}"#)
            .send()
            .await;
        assert!(result.is_err());
    }
}
