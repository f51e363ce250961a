//! Paginated fetch against a document store

use crate::error::{ServiceError, ServiceOperation};
use crate::store::{Document, DocumentStore, StoreError};

use super::query::NormalizedQuery;
use super::response::PaginatedResponse;

/// Fetch one page of matching documents plus the collection and match counts
///
/// The page fetch, the total count and the filtered count are issued together
/// and all three run to completion. Any failure fails the whole call; the
/// first failure in the order fetch, total, filtered is reported.
///
/// # Example
///
/// ```rust,ignore
/// let normalized = QueryNormalizer::new().normalize(&raw)?;
/// let page = paginate(&store, &normalized).await?;
/// assert!(page.data.len() as u64 <= normalized.limit);
/// ```
#[tracing::instrument(
    skip(store, query),
    fields(page = query.page, limit = query.limit, offset = query.skip(), sorted_by = %query.sorted_by)
)]
pub async fn paginate<S: DocumentStore>(
    store: &S,
    query: &NormalizedQuery,
) -> Result<PaginatedResponse<Document>, ServiceError> {
    let (data, items_count, items_found) = futures::join!(
        store.find(&query.filter, query.find_options()),
        store.count(None),
        store.count(Some(&query.filter)),
    );

    let wrap = |err: StoreError| {
        ServiceError::store_failure(ServiceOperation::FindAllWithPagination, err)
    };
    let data = data.map_err(wrap)?;
    let items_count = items_count.map_err(wrap)?;
    let items_found = items_found.map_err(wrap)?;

    tracing::debug!(items_count, items_found, returned = data.len(), "page fetched");

    Ok(PaginatedResponse::new(
        query.page,
        query.limit,
        items_count,
        items_found,
        data,
    ))
}
