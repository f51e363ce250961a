//! # user-service
//!
//! User service core: query normalization, paginated reads over a document
//! store, and point operations with a uniform "exists or fail" contract.
//!
//! ## Features
//!
//! - **Query normalization**: raw query-string objects become a typed filter
//!   plus page, limit and sort ([`pagination::QueryNormalizer`])
//! - **Paginated reads**: page fetch, total count and filtered count issued
//!   concurrently ([`pagination::paginate`])
//! - **Entity access**: create, find, update and delete with not-found
//!   reported as status 422 ([`users::UserService`])
//! - **Pluggable store**: [`store::DocumentStore`] with an in-memory backend
//! - **HTTP surface**: axum routes, health probes, graceful shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use user_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone(), InMemoryStore::new());
//!
//!     Server::new(config).serve(app(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod observability;
pub mod pagination;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;
pub mod users;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, PaginationConfig, ServiceConfig};
    pub use crate::error::{
        Error, ErrorResponse, Result, ServiceError, ServiceErrorKind, ServiceOperation,
    };
    pub use crate::health::{health, readiness};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::pagination::{
        paginate, NormalizedQuery, PaginatedResponse, QueryNormalizer, RawQuery,
    };
    pub use crate::routes::app;
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{
        Document, DocumentStore, Filter, FindOptions, InMemoryStore, SortSpec, StoreError,
    };
    pub use crate::users::{NewUser, User, UserPatch, UserService};

    pub use axum::{
        extract::{Path, Query, State},
        routing::{delete, get, patch, post},
        Json, Router,
    };
    pub use serde::{Deserialize, Serialize};
    pub use tokio;
    pub use tracing::{debug, error, info, instrument, trace, warn};
}
