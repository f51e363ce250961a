//! Paginated response envelope
//!
//! # Example
//!
//! ```rust
//! use user_service::pagination::PaginatedResponse;
//!
//! let response = PaginatedResponse::new(2, 5, 12, 7, vec!["f", "g"]);
//! assert_eq!(response.total_pages(), 2);
//! assert!(!response.has_next());
//! assert!(response.has_prev());
//!
//! let json = serde_json::to_value(&response).unwrap();
//! assert_eq!(json["perPage"], 5);
//! assert_eq!(json["itemsCount"], 12);
//! assert_eq!(json["itemsFound"], 7);
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// One page of results plus collection and match counts
///
/// `items_count` is the size of the whole collection and ignores the filter;
/// `items_found` counts documents matching the filter. Both are computed
/// independently of `data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Current page number (1-indexed)
    pub page: u64,
    /// Requested page size
    pub per_page: u64,
    /// Total documents in the collection regardless of filter
    pub items_count: u64,
    /// Documents matching the filter
    pub items_found: u64,
    /// The page slice
    pub data: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// Create a paginated response
    pub fn new(page: u64, per_page: u64, items_count: u64, items_found: u64, data: Vec<T>) -> Self {
        Self {
            page,
            per_page,
            items_count,
            items_found,
            data,
        }
    }

    /// Number of pages needed for the matched documents, rounding up
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        let per_page = self.per_page.max(1);
        self.items_found.div_ceil(per_page)
    }

    /// Whether a later page holds matching documents
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Whether this is not the first page
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Map each item to a new type
    pub fn map<U, F>(self, f: F) -> PaginatedResponse<U>
    where
        F: FnMut(T) -> U,
    {
        PaginatedResponse {
            page: self.page,
            per_page: self.per_page,
            items_count: self.items_count,
            items_found: self.items_found,
            data: self.data.into_iter().map(f).collect(),
        }
    }

    /// Map each item with a fallible conversion, failing on the first error
    pub fn try_map<U, E, F>(self, f: F) -> Result<PaginatedResponse<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let data = self.data.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(PaginatedResponse {
            page: self.page,
            per_page: self.per_page,
            items_count: self.items_count,
            items_found: self.items_found,
            data,
        })
    }
}

impl<T: Serialize> IntoResponse for PaginatedResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
