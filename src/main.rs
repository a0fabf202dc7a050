use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinesignal_api::{
    config::Config,
    db::{create_redis_client, Cache},
    routes::{create_router, AppState},
    services::{
        providers::{TeiEmbedder, TmdbCatalog, ZeroShotClassifier},
        Recommender,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinesignal_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    // Catalog caching is optional
    let (cache, cache_writer) = match create_redis_client(&config.redis_url) {
        Ok(client) => {
            let (cache, writer) = Cache::new(client);
            (cache, Some(writer))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, catalog caching disabled");
            (Cache::disabled(), None)
        }
    };

    let catalog = TmdbCatalog::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    );
    let embedder = TeiEmbedder::new(config.embedding_url.clone(), config.inference_token.clone());
    let classifier =
        ZeroShotClassifier::new(config.classifier_url.clone(), config.inference_token.clone());

    let recommender = Recommender::from_config(
        &config,
        Arc::new(classifier),
        Arc::new(embedder),
        Arc::new(catalog),
    );

    let app = create_router(Arc::new(AppState { recommender }));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
