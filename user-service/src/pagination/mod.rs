//! Query normalization and paginated reads
//!
//! The read path for list endpoints runs in two steps:
//!
//! 1. [`QueryNormalizer`] turns a [`RawQuery`] into a [`NormalizedQuery`]
//!    (typed filter, page, limit and sort)
//! 2. [`paginate`] runs it against a [`DocumentStore`](crate::store::DocumentStore)
//!    and returns a [`PaginatedResponse`]
//!
//! # Example
//!
//! ```rust,ignore
//! use user_service::pagination::{paginate, QueryNormalizer, RawQuery};
//!
//! let raw = RawQuery::from_pairs([("page", "2"), ("limit", "5"), ("age[gte]", "18")]);
//! let query = QueryNormalizer::new().normalize(&raw)?;
//! let page = paginate(&store, &query).await?;
//! println!("{} of {} users match", page.items_found, page.items_count);
//! ```

mod executor;
mod query;
mod response;

pub use executor::paginate;
pub use query::{
    rewrite_operators, NormalizedQuery, QueryNormalizer, RawQuery, DEFAULT_LIMIT, DEFAULT_PAGE,
    DEFAULT_SORTED_BY, LIMIT_KEY, PAGE_KEY, SORTED_BY_KEY,
};
pub use response::PaginatedResponse;
