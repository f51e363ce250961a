//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::pagination::QueryNormalizer;
use crate::store::DocumentStore;
use crate::users::UserService;

/// State handed to every request handler
///
/// Cloning is cheap; the configuration and the user service are shared.
pub struct AppState<S> {
    config: Arc<Config>,
    users: Arc<UserService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            users: Arc::clone(&self.users),
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    /// Build state around a store, applying the configured pagination defaults
    pub fn new(config: Config, store: S) -> Self {
        let normalizer = QueryNormalizer::from_config(&config.pagination);
        Self {
            config: Arc::new(config),
            users: Arc::new(UserService::with_normalizer(store, normalizer)),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the user service
    pub fn users(&self) -> &UserService<S> {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::RawQuery;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_state_applies_pagination_config() {
        let mut config = Config::default();
        config.pagination.default_limit = 3;
        let state = AppState::new(config, InMemoryStore::new());

        let page = state
            .users()
            .find_all_with_pagination(&RawQuery::new())
            .await
            .unwrap();
        assert_eq!(page.per_page, 3);
    }

    #[test]
    fn test_clone_shares_service() {
        let state = AppState::new(Config::default(), InMemoryStore::new());
        let clone = state.clone();
        assert!(std::ptr::eq(state.users(), clone.users()));
        assert_eq!(clone.config().service.name, "user-service");
    }
}
