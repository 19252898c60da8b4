use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use readstack_api::{
    config::Config,
    db::{self, CatalogCache, PostgresStore},
    routes::{create_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;

    // The catalog cache is optional: without Redis every query goes to Postgres
    let store = match db::create_redis_client(&config.redis_url) {
        Ok(client) => PostgresStore::with_cache(pool, CatalogCache::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, running without catalog cache");
            PostgresStore::new(pool)
        }
    };

    let store = Arc::new(store);
    let state = AppState::new(store.clone(), store);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
