//! Document store abstraction
//!
//! The service talks to persistence through the [`DocumentStore`] trait. The
//! store deals in untyped JSON documents and typed [`Filter`]s; entity
//! mapping happens in the service layer.
//!
//! # Features
//!
//! - **Store contract**: [`DocumentStore`] with find, count and single-document CRUD
//! - **Filtering**: [`Filter`] built from a normalized query, with equality and
//!   the four [`ComparisonOperator`]s
//! - **Sorting and windows**: [`SortSpec`] and [`FindOptions`]
//! - **Backend**: [`InMemoryStore`]
//! - **Errors**: [`StoreError`] carrying operation, kind and optional status

mod error;
mod filter;
mod memory;
mod traits;

pub use error::{StoreError, StoreErrorKind, StoreOperation, StoreResult};
pub use filter::{
    ComparisonOperator, FieldPredicate, Filter, FilterError, FindOptions, OrderDirection,
    SortKey, SortSpec, OPERATOR_SIGIL,
};
pub use memory::InMemoryStore;
pub use traits::{Document, DocumentStore, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
