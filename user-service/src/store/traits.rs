//! Document store trait
//!
//! The contract the service expects from its persistence collaborator. The
//! trait uses return-position `impl Future` so backends write plain
//! `async fn` bodies without `async_trait`.
//!
//! Every method is a single store operation and is atomic with respect to one
//! document. Conditional mutations report whether a document matched, so
//! callers can detect a concurrent delete without a separate lookup.
//!
//! # Example
//!
//! ```rust,ignore
//! use user_service::store::{Document, DocumentStore, Filter, FindOptions, SortSpec, StoreResult};
//!
//! async fn newest_admins<S: DocumentStore>(store: &S) -> StoreResult<Vec<Document>> {
//!     let filter = Filter::all().equals("role", "admin");
//!     store.find(&filter, FindOptions::new(SortSpec::parse("-createdAt"), 0, 5)).await
//! }
//! ```

use std::future::Future;

use serde_json::{Map, Value};

use super::error::StoreResult;
use super::filter::{Filter, FindOptions};

/// A stored document: a JSON object with at least an `id` field
pub type Document = Map<String, Value>;

/// Field holding a document's identifier
pub const ID_FIELD: &str = "id";

/// Field holding a document's creation timestamp
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Field holding a document's last modification timestamp
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Persistence collaborator for a single collection
pub trait DocumentStore: Send + Sync {
    /// Fetch the documents matching `filter`, sorted, skipped and limited per `options`
    fn find(
        &self,
        filter: &Filter,
        options: FindOptions,
    ) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;

    /// Fetch a single document by identifier
    fn find_by_id(&self, id: &str) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Count documents; `None` counts the whole collection
    fn count(&self, filter: Option<&Filter>) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Insert a document, returning it with generated fields filled in
    fn insert(&self, document: Document) -> impl Future<Output = StoreResult<Document>> + Send;

    /// Merge `changes` into the document with `id` and return the post-update document
    ///
    /// Returns `Ok(None)` when no document has that identifier; nothing is written.
    fn find_one_and_update(
        &self,
        id: &str,
        changes: Document,
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Delete the document with `id`, returning whether one was removed
    fn delete_one(&self, id: &str) -> impl Future<Output = StoreResult<bool>> + Send;
}
