use axum::{routing::get, Json};
use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_campaigns::{CampaignService, EmailStream};
use stream_worker::{connect_with_retry, RedisStatusStore, RetryPolicy, StreamProducer};
use tracing::info;

mod api;
mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.environment);

    info!("Connecting to broker at {}", config.redis.broker_url);
    let broker = connect_with_retry(&config.redis.broker_url, &RetryPolicy::default()).await?;

    let results = if config.redis.result_store_url == config.redis.broker_url {
        broker.clone()
    } else {
        info!(
            "Connecting to result store at {}",
            config.redis.result_store_url
        );
        connect_with_retry(&config.redis.result_store_url, &RetryPolicy::default()).await?
    };

    // Wire the domain service: producer onto the delivery stream plus the
    // job-state store
    let producer = StreamProducer::from_stream_def::<EmailStream>(broker.clone());
    let service = CampaignService::new(producer, RedisStatusStore::new(results.clone()));

    // Build router with API routes and OpenAPI docs
    let api_routes = api::routes(service);
    let router = create_router::<openapi::ApiDoc>(api_routes)?;

    let app = router
        .route("/", get(root))
        .merge(health_router(config.app))
        .merge(api::health::ready_router(results));

    info!("Starting {} v{}", config.app.name, config.app.version);
    create_app(app, &config.server).await?;

    info!("{} shutdown complete", config.app.name);
    Ok(())
}

/// Root welcome payload with a pointer at the interactive docs.
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the bulk email sender",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/swagger-ui",
    }))
}
