//! In-memory document store
//!
//! Keeps a single collection in insertion order behind a `tokio` read-write
//! lock. Suitable for development, tests and small deployments; every
//! operation holds the lock for its whole duration, which makes each one
//! atomic.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{StoreError, StoreOperation, StoreResult};
use super::filter::{Filter, FindOptions};
use super::traits::{Document, DocumentStore, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

/// Document store backed by process memory
///
/// Cloning is cheap and clones share the same collection.
///
/// # Example
///
/// ```rust,ignore
/// use serde_json::json;
/// use user_service::store::{DocumentStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// let doc = json!({"name": "Alice"}).as_object().cloned().unwrap();
/// let created = store.insert(doc).await?;
/// assert!(created.contains_key("id"));
/// assert_eq!(store.count(None).await?, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

impl DocumentStore for InMemoryStore {
    async fn find(&self, filter: &Filter, options: FindOptions) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut matched: Vec<&Document> = documents.iter().filter(|d| filter.matches(d)).collect();

        if !options.sort.is_empty() {
            // stable: ties keep insertion order
            matched.sort_by(|a, b| options.sort.compare(a, b));
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = match options.limit {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };

        let page: Vec<Document> = matched.into_iter().skip(skip).take(limit).cloned().collect();
        tracing::debug!(
            matched = page.len(),
            skip = options.skip,
            limit = options.limit,
            "in-memory find"
        );
        Ok(page)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .find(|d| document_id(d) == Some(id))
            .cloned())
    }

    async fn count(&self, filter: Option<&Filter>) -> StoreResult<u64> {
        let documents = self.documents.read().await;
        let count = match filter {
            Some(filter) => documents.iter().filter(|d| filter.matches(d)).count(),
            None => documents.len(),
        };
        Ok(count as u64)
    }

    async fn insert(&self, mut document: Document) -> StoreResult<Document> {
        let mut documents = self.documents.write().await;

        let id = match document.get(ID_FIELD) {
            None | Some(Value::Null) => Uuid::now_v7().to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StoreError::constraint_violation(
                    StoreOperation::Insert,
                    format!("document id must be a string, found {}", other),
                )
                .with_status(400));
            }
        };

        if documents.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(StoreError::constraint_violation(
                StoreOperation::Insert,
                format!("duplicate key: id {}", id),
            )
            .with_status(409));
        }

        let now = timestamp();
        document.insert(ID_FIELD.to_string(), Value::String(id));
        document
            .entry(CREATED_AT_FIELD)
            .or_insert_with(|| now.clone());
        document.insert(UPDATED_AT_FIELD.to_string(), now);

        documents.push(document.clone());
        Ok(document)
    }

    async fn find_one_and_update(&self, id: &str, changes: Document) -> StoreResult<Option<Document>> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.iter_mut().find(|d| document_id(d) == Some(id)) else {
            return Ok(None);
        };

        for (field, value) in changes {
            if field == ID_FIELD || field == CREATED_AT_FIELD {
                continue;
            }
            document.insert(field, value);
        }
        document.insert(UPDATED_AT_FIELD.to_string(), timestamp());

        Ok(Some(document.clone()))
    }

    async fn delete_one(&self, id: &str) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| document_id(d) != Some(id));
        Ok(documents.len() != before)
    }
}
