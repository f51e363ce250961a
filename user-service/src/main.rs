use user_service::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    tracing::info!(
        environment = %config.service.environment,
        "Using in-memory user store"
    );
    let state = AppState::new(config.clone(), InMemoryStore::new());

    let result = Server::new(config).serve(app(state)).await;
    shutdown_tracing();
    result
}
