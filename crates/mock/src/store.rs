//! Table storage behind the mock endpoint.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{MockError, Result};
use crate::expression::{Expression, Placeholders};
use crate::protocol::{
    AttributeDefinition, BatchWriteItemInput, CreateTableInput, GetItemInput, KeySchemaElement,
    Page, ProvisionedThroughputDescription, QueryInput, ScanInput, TableDescription,
};
use crate::value::{AttributeValue, Item};

/// Largest number of requests accepted by one `BatchWriteItem` call.
pub const MAX_BATCH_WRITE: usize = 25;

/// Size after which a scan or query page is cut, as DynamoDB does at 1 MB.
pub const DEFAULT_PAGE_BYTES: usize = 1024 * 1024;

const REGION: &str = "local";
const ACCOUNT: &str = "000000000000";

#[derive(Debug)]
struct Table {
    name: String,
    partition_key: String,
    key_schema: Vec<KeySchemaElement>,
    attribute_definitions: Vec<AttributeDefinition>,
    throughput: ProvisionedThroughputDescription,
    items: BTreeMap<String, Item>,
}

impl Table {
    fn describe(&self) -> TableDescription {
        TableDescription {
            table_name: self.name.clone(),
            table_arn: format!("arn:aws:dynamodb:{REGION}:{ACCOUNT}:table/{}", self.name),
            table_status: "ACTIVE".to_string(),
            key_schema: self.key_schema.clone(),
            attribute_definitions: self.attribute_definitions.clone(),
            provisioned_throughput: self.throughput.clone(),
            item_count: self.items.len(),
        }
    }

    fn key_type(&self) -> &str {
        self.attribute_definitions
            .iter()
            .find(|definition| definition.attribute_name == self.partition_key)
            .map(|definition| definition.attribute_type.as_str())
            .unwrap_or("S")
    }

    /// Storage key of an item or key map, checked against the key schema.
    fn key_of(&self, item: &Item) -> Result<String> {
        let value = item.get(&self.partition_key).ok_or_else(|| {
            MockError::Validation(format!(
                "One or more parameter values were invalid: Missing the key {} in the item",
                self.partition_key
            ))
        })?;
        if value.type_name() != self.key_type() {
            return Err(MockError::Validation(format!(
                "One or more parameter values were invalid: Type mismatch for key {} expected: {} actual: {}",
                self.partition_key,
                self.key_type(),
                value.type_name()
            )));
        }
        match value {
            AttributeValue::S(s) if s.is_empty() => Err(MockError::Validation(format!(
                "One or more parameter values are not valid. The AttributeValue for a key \
                 attribute cannot contain an empty string value. Key: {}",
                self.partition_key
            ))),
            AttributeValue::S(s) | AttributeValue::N(s) => Ok(s.clone()),
            other => Err(MockError::Validation(format!(
                "Unsupported key attribute type {}",
                other.type_name()
            ))),
        }
    }

    /// Like [`Table::key_of`] but rejects attributes outside the key schema.
    fn exact_key_of(&self, key: &Item) -> Result<String> {
        if key.len() != 1 {
            return Err(MockError::Validation(
                "The provided key element does not match the schema".to_string(),
            ));
        }
        self.key_of(key)
    }

    fn put(&mut self, item: Item) -> Result<()> {
        for value in item.values() {
            value.validate().map_err(MockError::Validation)?;
        }
        let key = self.key_of(&item)?;
        self.items.insert(key, item);
        Ok(())
    }

    fn key_item(&self, item: &Item) -> Item {
        item.iter()
            .filter(|(name, _)| **name == self.partition_key)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Shared, thread-safe table storage.
#[derive(Debug, Clone)]
pub struct MockStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    page_bytes: usize,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            page_bytes: DEFAULT_PAGE_BYTES,
        }
    }

    /// Cuts scan and query pages after `bytes` of item data.
    pub fn with_page_bytes(mut self, bytes: usize) -> Self {
        self.page_bytes = bytes.max(1);
        self
    }

    pub async fn create_table(&self, input: CreateTableInput) -> Result<TableDescription> {
        validate_table_name(&input.table_name)?;

        let partition_key = match input.key_schema.as_slice() {
            [element] if element.key_type == "HASH" => element.attribute_name.clone(),
            [_, _] => {
                return Err(MockError::Validation(
                    "Sort keys are not supported by this endpoint".to_string(),
                ))
            }
            _ => {
                return Err(MockError::Validation(
                    "1 validation error detected: Value at 'keySchema' failed to satisfy \
                     constraint: exactly one HASH key is required"
                        .to_string(),
                ))
            }
        };

        let definition = input
            .attribute_definitions
            .iter()
            .find(|definition| definition.attribute_name == partition_key)
            .ok_or_else(|| {
                MockError::Validation(
                    "One or more parameter values were invalid: Some index key attributes are \
                     not defined in AttributeDefinitions"
                        .to_string(),
                )
            })?;
        if !matches!(definition.attribute_type.as_str(), "S" | "N") {
            return Err(MockError::Validation(format!(
                "Member must satisfy enum value set: [S, N] for key attribute {partition_key}"
            )));
        }

        let throughput = input
            .provisioned_throughput
            .map(|throughput| ProvisionedThroughputDescription {
                read_capacity_units: throughput.read_capacity_units,
                write_capacity_units: throughput.write_capacity_units,
                number_of_decreases_today: 0,
            })
            .unwrap_or_default();

        let mut tables = self.tables.write().await;
        if tables.contains_key(&input.table_name) {
            return Err(MockError::ResourceInUse(input.table_name));
        }

        let table = Table {
            name: input.table_name.clone(),
            partition_key,
            key_schema: input.key_schema,
            attribute_definitions: input.attribute_definitions,
            throughput,
            items: BTreeMap::new(),
        };
        let description = table.describe();
        tables.insert(input.table_name, table);

        tracing::info!(table = %description.table_name, "Created table");
        Ok(description)
    }

    pub async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let tables = self.tables.read().await;
        Ok(lookup(&tables, table_name)?.describe())
    }

    pub async fn delete_table(&self, table_name: &str) -> Result<TableDescription> {
        let mut tables = self.tables.write().await;
        let table = tables
            .remove(table_name)
            .ok_or_else(|| MockError::ResourceNotFound(table_name.to_string()))?;

        tracing::info!(table = %table_name, "Deleted table");
        let mut description = table.describe();
        description.table_status = "DELETING".to_string();
        Ok(description)
    }

    pub async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        let table = lookup(&tables, &input.table_name)?;
        let key = table.exact_key_of(&input.key)?;
        Ok(table.items.get(&key).cloned())
    }

    pub async fn batch_write_item(&self, input: BatchWriteItemInput) -> Result<()> {
        let total: usize = input.request_items.values().map(Vec::len).sum();
        if total == 0 {
            return Err(MockError::Validation(
                "1 validation error detected: Value at 'requestItems' failed to satisfy \
                 constraint: Member must have at least 1 item"
                    .to_string(),
            ));
        }
        if total > MAX_BATCH_WRITE {
            return Err(MockError::Validation(format!(
                "Too many items requested for the BatchWriteItem call: {total} > {MAX_BATCH_WRITE}"
            )));
        }

        let mut tables = self.tables.write().await;
        for table_name in input.request_items.keys() {
            lookup(&tables, table_name)?;
        }

        for (table_name, requests) in input.request_items {
            let table = lookup_mut(&mut tables, &table_name)?;
            for request in requests {
                let put = request.put_request.ok_or_else(|| {
                    MockError::Validation(
                        "Only PutRequest entries are supported by this endpoint".to_string(),
                    )
                })?;
                table.put(put.item)?;
            }
            tracing::debug!(table = %table_name, items = table.items.len(), "Applied batch write");
        }

        Ok(())
    }

    pub async fn scan(&self, input: ScanInput) -> Result<Page> {
        validate_limit(input.limit)?;

        let mut placeholders = Placeholders::new(
            input.expression_attribute_names,
            input.expression_attribute_values,
        );
        let filter = input
            .filter_expression
            .as_deref()
            .map(|source| placeholders.parse(source))
            .transpose()?;
        placeholders.finish()?;

        let tables = self.tables.read().await;
        let table = lookup(&tables, &input.table_name)?;

        let start = match &input.exclusive_start_key {
            Some(key) => Bound::Excluded(table.exact_key_of(key)?),
            None => Bound::Unbounded,
        };
        let candidates = table
            .items
            .range::<String, _>((start, Bound::Unbounded))
            .map(|(_, item)| item);

        Ok(self.page(table, candidates, filter.as_ref(), input.limit))
    }

    pub async fn query(&self, input: QueryInput) -> Result<Page> {
        validate_limit(input.limit)?;

        let source = input.key_condition_expression.as_deref().ok_or_else(|| {
            MockError::Validation(
                "Either the KeyConditions or KeyConditionExpression parameter must be specified \
                 in the request."
                    .to_string(),
            )
        })?;

        let mut placeholders = Placeholders::new(
            input.expression_attribute_names,
            input.expression_attribute_values,
        );
        let key_condition = placeholders.parse(source)?;
        let filter = input
            .filter_expression
            .as_deref()
            .map(|source| placeholders.parse(source))
            .transpose()?;
        placeholders.finish()?;

        let tables = self.tables.read().await;
        let table = lookup(&tables, &input.table_name)?;

        let partition_value = key_condition
            .equality_on(&table.partition_key)
            .ok_or_else(|| {
                MockError::Validation(format!(
                    "Query condition missed key schema element: {}",
                    table.partition_key
                ))
            })?;
        let key = table.key_of(&HashMap::from([(
            table.partition_key.clone(),
            partition_value.clone(),
        )]))?;

        if let Some(start) = &input.exclusive_start_key {
            if table.exact_key_of(start)? == key {
                return Ok(Page::default());
            }
        }

        let matched = table
            .items
            .get(&key)
            .into_iter()
            .filter(|item| key_condition.evaluate(item));

        Ok(self.page(table, matched, filter.as_ref(), input.limit))
    }

    /// Evaluates candidates in order until the limit or the page size is hit.
    fn page<'a>(
        &self,
        table: &Table,
        candidates: impl Iterator<Item = &'a Item>,
        filter: Option<&Expression>,
        limit: Option<usize>,
    ) -> Page {
        let mut candidates = candidates.peekable();
        let mut items = Vec::new();
        let mut scanned = 0;
        let mut bytes = 0;
        let mut last = None;

        while let Some(item) = candidates.next() {
            scanned += 1;
            bytes += item_size(item);
            if filter.map_or(true, |filter| filter.evaluate(item)) {
                items.push(item.clone());
            }

            let limit_reached = limit.is_some_and(|limit| scanned >= limit);
            if (limit_reached || bytes >= self.page_bytes) && candidates.peek().is_some() {
                last = Some(table.key_item(item));
                break;
            }
        }

        Page {
            count: items.len(),
            items,
            scanned_count: scanned,
            last_evaluated_key: last,
        }
    }
}

fn lookup<'a>(tables: &'a HashMap<String, Table>, name: &str) -> Result<&'a Table> {
    tables
        .get(name)
        .ok_or_else(|| MockError::ResourceNotFound(name.to_string()))
}

fn lookup_mut<'a>(tables: &'a mut HashMap<String, Table>, name: &str) -> Result<&'a mut Table> {
    tables
        .get_mut(name)
        .ok_or_else(|| MockError::ResourceNotFound(name.to_string()))
}

fn validate_table_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if (3..=255).contains(&name.len()) && valid_chars {
        Ok(())
    } else {
        Err(MockError::Validation(format!(
            "1 validation error detected: Value '{name}' at 'tableName' failed to satisfy \
             constraint: Member must satisfy regular expression pattern: [a-zA-Z0-9_.-]+"
        )))
    }
}

fn validate_limit(limit: Option<usize>) -> Result<()> {
    match limit {
        Some(0) => Err(MockError::Validation(
            "1 validation error detected: Value '0' at 'limit' failed to satisfy constraint: \
             Member must have value greater than or equal to 1"
                .to_string(),
        )),
        _ => Ok(()),
    }
}

/// Approximate stored size of an item in bytes.
fn item_size(item: &Item) -> usize {
    item.iter()
        .map(|(name, value)| name.len() + value_size(value))
        .sum()
}

fn value_size(value: &AttributeValue) -> usize {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => s.len(),
        AttributeValue::Bool(_) | AttributeValue::Null(_) => 1,
        AttributeValue::L(values) => 3 + values.iter().map(|v| 1 + value_size(v)).sum::<usize>(),
        AttributeValue::M(map) => 3 + item_size(map) + map.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ProvisionedThroughput, PutRequest, WriteRequest};

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn n(value: u64) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    fn item(id: &str, string: &str, number: u64) -> Item {
        HashMap::from([
            ("id".to_string(), s(id)),
            ("string".to_string(), s(string)),
            ("number".to_string(), n(number)),
        ])
    }

    fn put(item: Item) -> WriteRequest {
        WriteRequest {
            put_request: Some(PutRequest { item }),
        }
    }

    fn batch(requests: Vec<WriteRequest>) -> BatchWriteItemInput {
        BatchWriteItemInput {
            request_items: HashMap::from([("LargeItem".to_string(), requests)]),
        }
    }

    fn create_input(name: &str) -> CreateTableInput {
        CreateTableInput {
            table_name: name.to_string(),
            key_schema: vec![KeySchemaElement {
                attribute_name: "id".to_string(),
                key_type: "HASH".to_string(),
            }],
            attribute_definitions: vec![AttributeDefinition {
                attribute_name: "id".to_string(),
                attribute_type: "S".to_string(),
            }],
            provisioned_throughput: Some(ProvisionedThroughput {
                read_capacity_units: 1_000_000,
                write_capacity_units: 1_000_000,
            }),
            billing_mode: None,
        }
    }

    async fn seeded_store() -> MockStore {
        let store = MockStore::new();
        store.create_table(create_input("LargeItem")).await.unwrap();
        let requests = [
            item("a", "Lion", 10),
            item("b", "Lion", 20),
            item("c", "Monkey", 30),
            item("d", "Lion", 40),
        ]
        .into_iter()
        .map(put)
        .collect();
        store.batch_write_item(batch(requests)).await.unwrap();
        store
    }

    fn ids(page: &Page) -> Vec<String> {
        page.items
            .iter()
            .map(|item| match &item["id"] {
                AttributeValue::S(id) => id.clone(),
                other => panic!("unexpected id {other:?}"),
            })
            .collect()
    }

    fn filter_scan(limit: Option<usize>, start: Option<Item>) -> ScanInput {
        ScanInput {
            table_name: "LargeItem".to_string(),
            filter_expression: Some("#s = :s AND #n > :n".to_string()),
            expression_attribute_names: Some(HashMap::from([
                ("#s".to_string(), "string".to_string()),
                ("#n".to_string(), "number".to_string()),
            ])),
            expression_attribute_values: Some(HashMap::from([
                (":s".to_string(), s("Lion")),
                (":n".to_string(), n(10)),
            ])),
            limit,
            exclusive_start_key: start,
        }
    }

    #[tokio::test]
    async fn test_create_describe_delete() {
        let store = MockStore::new();
        let description = store.create_table(create_input("LargeItem")).await.unwrap();
        assert_eq!(description.table_status, "ACTIVE");
        assert_eq!(description.provisioned_throughput.read_capacity_units, 1_000_000);

        assert_eq!(
            store.create_table(create_input("LargeItem")).await,
            Err(MockError::ResourceInUse("LargeItem".to_string()))
        );
        assert_eq!(
            store.describe_table("LargeItem").await.unwrap().item_count,
            0
        );

        let deleted = store.delete_table("LargeItem").await.unwrap();
        assert_eq!(deleted.table_status, "DELETING");
        assert!(matches!(
            store.describe_table("LargeItem").await,
            Err(MockError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_table_requires_defined_hash_key() {
        let store = MockStore::new();
        let mut input = create_input("LargeItem");
        input.attribute_definitions.clear();
        assert!(matches!(
            store.create_table(input).await,
            Err(MockError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_item() {
        let store = seeded_store().await;
        let found = store
            .get_item(GetItemInput {
                table_name: "LargeItem".to_string(),
                key: HashMap::from([("id".to_string(), s("b"))]),
            })
            .await
            .unwrap();
        assert_eq!(found, Some(item("b", "Lion", 20)));

        let missing = store
            .get_item(GetItemInput {
                table_name: "LargeItem".to_string(),
                key: HashMap::from([("id".to_string(), s("zzz"))]),
            })
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_get_item_rejects_non_key_attributes() {
        let store = seeded_store().await;
        let result = store
            .get_item(GetItemInput {
                table_name: "LargeItem".to_string(),
                key: item("b", "Lion", 20),
            })
            .await;
        assert!(matches!(result, Err(MockError::Validation(_))));
    }

    #[tokio::test]
    async fn test_batch_write_replaces_existing_item() {
        let store = seeded_store().await;
        store
            .batch_write_item(batch(vec![put(item("a", "Elephant", 1))]))
            .await
            .unwrap();

        assert_eq!(
            store.describe_table("LargeItem").await.unwrap().item_count,
            4
        );
        let found = store
            .get_item(GetItemInput {
                table_name: "LargeItem".to_string(),
                key: HashMap::from([("id".to_string(), s("a"))]),
            })
            .await
            .unwrap();
        assert_eq!(found, Some(item("a", "Elephant", 1)));
    }

    #[tokio::test]
    async fn test_batch_write_rejects_empty_key() {
        let store = seeded_store().await;
        let result = store
            .batch_write_item(batch(vec![put(item("", "Lion", 1))]))
            .await;
        assert!(matches!(result, Err(MockError::Validation(_))));
    }

    #[tokio::test]
    async fn test_batch_write_limits() {
        let store = seeded_store().await;
        let requests = (0..26)
            .map(|i| put(item(&format!("x{i}"), "Lion", i)))
            .collect();
        let result = store.batch_write_item(batch(requests)).await;
        assert!(matches!(result, Err(MockError::Validation(_))));
    }

    #[tokio::test]
    async fn test_batch_write_requires_put_requests() {
        let store = seeded_store().await;
        let result = store
            .batch_write_item(batch(vec![WriteRequest { put_request: None }]))
            .await;
        assert!(matches!(result, Err(MockError::Validation(_))));
    }

    #[tokio::test]
    async fn test_scan_filter() {
        let store = seeded_store().await;
        let page = store.scan(filter_scan(None, None)).await.unwrap();
        assert_eq!(ids(&page), vec!["b", "d"]);
        assert_eq!(page.count, 2);
        assert_eq!(page.scanned_count, 4);
        assert_eq!(page.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_scan_without_filter_returns_every_item() {
        let store = seeded_store().await;
        let page = store
            .scan(ScanInput {
                table_name: "LargeItem".to_string(),
                ..ScanInput::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_scan_rejects_empty_filter() {
        let store = seeded_store().await;
        let result = store
            .scan(ScanInput {
                table_name: "LargeItem".to_string(),
                filter_expression: Some(String::new()),
                ..ScanInput::default()
            })
            .await;
        assert!(matches!(result, Err(MockError::Validation(_))));
    }

    #[tokio::test]
    async fn test_scan_pagination() {
        let store = seeded_store().await;
        let first = store.scan(filter_scan(Some(2), None)).await.unwrap();
        assert_eq!(ids(&first), vec!["b"]);
        assert_eq!(first.scanned_count, 2);
        let start = first.last_evaluated_key.clone().unwrap();
        assert_eq!(start, HashMap::from([("id".to_string(), s("b"))]));

        let second = store.scan(filter_scan(Some(2), Some(start))).await.unwrap();
        assert_eq!(ids(&second), vec!["d"]);
        assert_eq!(second.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_scan_page_size_cut() {
        let store = seeded_store().await.with_page_bytes(1);
        let page = store.scan(filter_scan(None, None)).await.unwrap();
        assert_eq!(page.scanned_count, 1);
        assert!(page.last_evaluated_key.is_some());
    }

    #[tokio::test]
    async fn test_scan_rejects_unused_placeholders() {
        let store = seeded_store().await;
        let mut input = filter_scan(None, None);
        input.filter_expression = Some("#s = :s".to_string());
        assert!(matches!(
            store.scan(input).await,
            Err(MockError::Validation(message)) if message.contains("unused")
        ));
    }

    #[tokio::test]
    async fn test_scan_unknown_table() {
        let store = MockStore::new();
        assert_eq!(
            store
                .scan(ScanInput {
                    table_name: "Nope".to_string(),
                    ..ScanInput::default()
                })
                .await,
            Err(MockError::ResourceNotFound("Nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_query_by_partition_key() {
        let store = seeded_store().await;
        let page = store
            .query(QueryInput {
                table_name: "LargeItem".to_string(),
                key_condition_expression: Some("#id = :id".to_string()),
                expression_attribute_names: Some(HashMap::from([(
                    "#id".to_string(),
                    "id".to_string(),
                )])),
                expression_attribute_values: Some(HashMap::from([(":id".to_string(), s("c"))])),
                ..QueryInput::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["c"]);
        assert_eq!(page.scanned_count, 1);
    }

    #[tokio::test]
    async fn test_query_unknown_id_is_empty() {
        let store = seeded_store().await;
        let page = store
            .query(QueryInput {
                table_name: "LargeItem".to_string(),
                key_condition_expression: Some("id = :id".to_string()),
                expression_attribute_values: Some(HashMap::from([(":id".to_string(), s("zzz"))])),
                ..QueryInput::default()
            })
            .await
            .unwrap();
        assert!(ids(&page).is_empty());
        assert_eq!(page.count, 0);
    }

    #[tokio::test]
    async fn test_query_requires_partition_key_equality() {
        let store = seeded_store().await;
        let result = store
            .query(QueryInput {
                table_name: "LargeItem".to_string(),
                key_condition_expression: Some("#s = :s".to_string()),
                expression_attribute_names: Some(HashMap::from([(
                    "#s".to_string(),
                    "string".to_string(),
                )])),
                expression_attribute_values: Some(HashMap::from([(":s".to_string(), s("Lion"))])),
                ..QueryInput::default()
            })
            .await;
        assert_eq!(
            result,
            Err(MockError::Validation(
                "Query condition missed key schema element: id".to_string()
            ))
        );
    }
}
