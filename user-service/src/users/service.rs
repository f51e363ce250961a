//! User operations over a document store
//!
//! [`UserService`] owns the store handle and the query normalizer. List reads
//! go through the pagination pipeline; point operations share one existence
//! contract: an identifier that matches nothing fails with `"User not found"`
//! (status 422).
//!
//! Updates and deletes use the store's conditional single-document
//! operations, so the existence check and the mutation are one atomic step.
//! A user deleted concurrently is reported as not found rather than silently
//! ignored.

use crate::error::{ServiceError, ServiceErrorKind, ServiceOperation};
use crate::pagination::{paginate, PaginatedResponse, QueryNormalizer, RawQuery};
use crate::store::{Document, DocumentStore, Filter, FindOptions, StoreError, StoreOperation};

use super::model::{NewUser, User, UserPatch};

/// Entity name used in not-found messages
pub const ENTITY_NAME: &str = "User";

/// User operations backed by a [`DocumentStore`]
///
/// # Example
///
/// ```rust,ignore
/// use user_service::store::InMemoryStore;
/// use user_service::users::{NewUser, UserService};
///
/// let service = UserService::new(InMemoryStore::new());
/// let created = service.create(NewUser::new("Ada", "ada@example.com")).await?;
/// let found = service.find_by_id(&created.id).await?;
/// assert_eq!(found, created);
/// ```
#[derive(Debug, Clone)]
pub struct UserService<S> {
    store: S,
    normalizer: QueryNormalizer,
}

impl<S: DocumentStore> UserService<S> {
    /// Service with the default query normalizer
    pub fn new(store: S) -> Self {
        Self::with_normalizer(store, QueryNormalizer::new())
    }

    /// Service with a custom query normalizer
    pub fn with_normalizer(store: S, normalizer: QueryNormalizer) -> Self {
        Self { store, normalizer }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every user in natural store order, unpaginated
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<User>, ServiceError> {
        let op = ServiceOperation::FindAll;
        let documents = self
            .store
            .find(&Filter::all(), FindOptions::default())
            .await
            .map_err(|e| ServiceError::store_failure(op, e))?;
        documents.into_iter().map(|d| decode(op, d)).collect()
    }

    /// One page of users matching a raw query
    #[tracing::instrument(skip(self, query))]
    pub async fn find_all_with_pagination(
        &self,
        query: &RawQuery,
    ) -> Result<PaginatedResponse<User>, ServiceError> {
        let normalized = self.normalizer.normalize(query)?;
        let page = paginate(&self.store, &normalized).await?;
        page.try_map(|d| decode(ServiceOperation::FindAllWithPagination, d))
    }

    /// Insert a new user as given
    ///
    /// Only the store's own constraints apply; request validation belongs to
    /// the caller.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: NewUser) -> Result<User, ServiceError> {
        let op = ServiceOperation::Create;
        let document = input
            .into_document()
            .map_err(|e| encode_failure(op, StoreOperation::Insert, e))?;
        let created = self
            .store
            .insert(document)
            .await
            .map_err(|e| ServiceError::store_failure(op, e))?;

        let user = decode(op, created)?;
        tracing::info!(id = %user.id, "user created");
        Ok(user)
    }

    /// The user with `id`, or not found
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<User, ServiceError> {
        let op = ServiceOperation::FindById;
        let document = self
            .store
            .find_by_id(id)
            .await
            .map_err(|e| ServiceError::store_failure(op, e))?
            .ok_or_else(|| ServiceError::not_found(ENTITY_NAME, op))?;
        decode(op, document)
    }

    /// Apply `patch` to the user with `id` and return the updated user
    ///
    /// Fails with not found, writing nothing, when no user has that id.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_by_id(&self, id: &str, patch: UserPatch) -> Result<User, ServiceError> {
        let op = ServiceOperation::UpdateById;
        patch
            .validate()
            .map_err(|msg| ServiceError::malformed_query(op, msg))?;

        let changes = patch
            .into_changes()
            .map_err(|e| encode_failure(op, StoreOperation::FindOneAndUpdate, e))?;
        let updated = self
            .store
            .find_one_and_update(id, changes)
            .await
            .map_err(|e| ServiceError::store_failure(op, e))?
            .ok_or_else(|| ServiceError::not_found(ENTITY_NAME, op))?;

        decode(op, updated)
    }

    /// Delete the user with `id`
    ///
    /// Fails with not found when no user has that id.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<(), ServiceError> {
        let op = ServiceOperation::DeleteById;
        let deleted = self
            .store
            .delete_one(id)
            .await
            .map_err(|e| ServiceError::store_failure(op, e))?;
        if !deleted {
            return Err(ServiceError::not_found(ENTITY_NAME, op));
        }
        tracing::info!("user deleted");
        Ok(())
    }
}

fn decode(operation: ServiceOperation, document: Document) -> Result<User, ServiceError> {
    User::try_from(document).map_err(|err| {
        ServiceError::new(
            operation,
            ServiceErrorKind::StoreFailure,
            format!("stored user could not be decoded: {}", err),
            None,
        )
    })
}

fn encode_failure(
    operation: ServiceOperation,
    store_operation: StoreOperation,
    err: serde_json::Error,
) -> ServiceError {
    let err = StoreError::serialization_error(store_operation, err.to_string());
    tracing::error!(error = %err, "user could not be encoded");
    ServiceError::store_failure(operation, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreResult};
    use serde_json::json;

    fn service() -> UserService<InMemoryStore> {
        UserService::new(InMemoryStore::new())
    }

    async fn seed(service: &UserService<InMemoryStore>, count: usize) -> Vec<User> {
        let mut users = Vec::with_capacity(count);
        for i in 0..count {
            let input = NewUser::new(format!("user-{}", i), format!("user{}@example.com", i))
                .with_age(20 + i as u32)
                .with_role(if i % 2 == 0 { "admin" } else { "staff" });
            users.push(service.create(input).await.unwrap());
            // createdAt has millisecond precision
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        users
    }

    /// Store that fails every call with a fixed status
    struct BrokenStore;

    fn broken(operation: StoreOperation) -> StoreError {
        StoreError::connection_failed(operation, "store unavailable").with_status(503)
    }

    impl DocumentStore for BrokenStore {
        async fn find(&self, _filter: &Filter, _options: FindOptions) -> StoreResult<Vec<Document>> {
            Err(broken(StoreOperation::Find))
        }

        async fn find_by_id(&self, _id: &str) -> StoreResult<Option<Document>> {
            Err(broken(StoreOperation::FindById))
        }

        async fn count(&self, _filter: Option<&Filter>) -> StoreResult<u64> {
            Err(broken(StoreOperation::Count))
        }

        async fn insert(&self, _document: Document) -> StoreResult<Document> {
            Err(broken(StoreOperation::Insert))
        }

        async fn find_one_and_update(&self, _id: &str, _changes: Document) -> StoreResult<Option<Document>> {
            Err(broken(StoreOperation::FindOneAndUpdate))
        }

        async fn delete_one(&self, _id: &str) -> StoreResult<bool> {
            Err(broken(StoreOperation::DeleteOne))
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() {
        let service = service();
        let created = service
            .create(NewUser::new("Ada", "ada@example.com").with_age(36))
            .await
            .unwrap();

        let found = service.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.name, "Ada");
    }

    #[tokio::test]
    async fn test_create_passes_input_through() {
        let service = service();
        let created = service
            .create(NewUser::new("Ada", "not-an-email"))
            .await
            .unwrap();
        assert_eq!(created.email, "not-an-email");
        assert_eq!(service.store().len().await, 1);
    }

    #[test]
    fn test_encode_failure_is_store_failure_for_the_operation() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let message = json_err.to_string();

        let err = encode_failure(
            ServiceOperation::UpdateById,
            StoreOperation::FindOneAndUpdate,
            json_err,
        );
        assert_eq!(err.kind, ServiceErrorKind::StoreFailure);
        assert_eq!(err.operation, ServiceOperation::UpdateById);
        assert_eq!(err.message, message);
        assert_eq!(err.status, None);
    }

    #[tokio::test]
    async fn test_find_by_id_missing_is_422() {
        let err = service().find_by_id("missing").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::NotFound);
        assert_eq!(err.message, "User not found");
        assert_eq!(err.status, Some(422));
    }

    #[tokio::test]
    async fn test_find_all_returns_everything_in_insertion_order() {
        let service = service();
        let users = seed(&service, 3).await;

        let all = service.find_all().await.unwrap();
        assert_eq!(all, users);
    }

    #[tokio::test]
    async fn test_pagination_end_to_end() {
        let service = service();
        let users = seed(&service, 5).await;
        let query = RawQuery::from_pairs([("page", "1"), ("limit", "2"), ("sortedBy", "createdAt")]);

        let page = service.find_all_with_pagination(&query).await.unwrap();
        assert_eq!(page.items_count, 5);
        assert_eq!(page.items_found, 5);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data, users[..2].to_vec());
    }

    #[tokio::test]
    async fn test_pagination_with_filter() {
        let service = service();
        seed(&service, 5).await;
        let query = RawQuery::from_pairs([("role", "admin"), ("age[gt]", "20")]);

        let page = service.find_all_with_pagination(&query).await.unwrap();
        assert_eq!(page.items_count, 5);
        assert_eq!(page.items_found, 2);
        let names: Vec<_> = page.data.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["user-2", "user-4"]);
    }

    #[tokio::test]
    async fn test_pagination_rejects_bad_page() {
        let query = RawQuery::from_pairs([("page", "zero")]);
        let err = service()
            .find_all_with_pagination(&query)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::MalformedQuery);
        assert_eq!(err.operation, ServiceOperation::FindAllWithPagination);
    }

    #[tokio::test]
    async fn test_update_by_id_returns_post_update_user() {
        let service = service();
        let created = service
            .create(NewUser::new("Ada", "ada@example.com"))
            .await
            .unwrap();

        let patch = UserPatch {
            name: Some("Ada Lovelace".to_string()),
            age: Some(36),
            ..Default::default()
        };
        let updated = service.update_by_id(&created.id, patch).await.unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.age, Some(36));
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(service.find_by_id(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_writes_nothing() {
        let service = service();
        seed(&service, 2).await;
        let before = service.find_all().await.unwrap();

        let patch = UserPatch {
            name: Some("ghost".to_string()),
            ..Default::default()
        };
        let err = service.update_by_id("missing", patch).await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::NotFound);
        assert_eq!(err.status, Some(422));
        assert_eq!(err.operation, ServiceOperation::UpdateById);

        assert_eq!(service.find_all().await.unwrap(), before);
        assert_eq!(service.store().len().await, 2);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_patch() {
        let service = service();
        let created = service
            .create(NewUser::new("Ada", "ada@example.com"))
            .await
            .unwrap();
        let patch = UserPatch {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        let err = service.update_by_id(&created.id, patch).await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::MalformedQuery);
        assert_eq!(service.find_by_id(&created.id).await.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_delete_then_find_is_not_found() {
        let service = service();
        let created = service
            .create(NewUser::new("Ada", "ada@example.com"))
            .await
            .unwrap();

        service.delete_by_id(&created.id).await.unwrap();
        let err = service.find_by_id(&created.id).await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::NotFound);
        assert_eq!(err.message, "User not found");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let err = service().delete_by_id("missing").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::NotFound);
        assert_eq!(err.operation, ServiceOperation::DeleteById);
    }

    #[tokio::test]
    async fn test_update_after_concurrent_delete_is_not_found() {
        let service = service();
        let created = service
            .create(NewUser::new("Ada", "ada@example.com"))
            .await
            .unwrap();

        // another caller removes the user between our lookup and our write
        service.store().delete_one(&created.id).await.unwrap();
        let patch = UserPatch {
            age: Some(40),
            ..Default::default()
        };
        let err = service.update_by_id(&created.id, patch).await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::NotFound);
        assert!(service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failures_keep_message_and_status() {
        let service = UserService::new(BrokenStore);

        let err = service.find_by_id("u1").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::StoreFailure);
        assert_eq!(err.message, "store unavailable");
        assert_eq!(err.status, Some(503));

        let err = service
            .find_all_with_pagination(&RawQuery::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::StoreFailure);
        assert_eq!(err.operation, ServiceOperation::FindAllWithPagination);

        let err = service.delete_by_id("u1").await.unwrap_err();
        assert_eq!(err.operation, ServiceOperation::DeleteById);
        assert_eq!(err.status, Some(503));
    }

    #[tokio::test]
    async fn test_undecodable_document_is_store_failure() {
        let service = service();
        let raw = json!({"name": "no email"}).as_object().cloned().unwrap();
        let inserted = service.store().insert(raw).await.unwrap();
        let id = inserted["id"].as_str().unwrap().to_string();

        let err = service.find_by_id(&id).await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::StoreFailure);
        assert_eq!(err.status, None);
        assert!(err.message.contains("could not be decoded"));
    }
}
