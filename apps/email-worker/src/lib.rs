//! Email Worker Service
//!
//! Consumes delivery jobs from the Redis stream and sends them through
//! the SMTP relay, one job at a time end-to-end. Serves liveness and
//! readiness probes on a side port.

use axum_helpers::shutdown_signal;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_campaigns::{DeliveryProcessor, EmailStream, SmtpTransport};
use stream_worker::{
    connect_with_retry, worker_router, HealthState, RedisStatusStore, RetryPolicy, StreamDef,
    StreamWorker, WorkerConfig,
};
use tokio::sync::watch;
use tracing::{error, info};

mod config;

use config::Config;

/// Run the worker until a shutdown signal arrives.
pub async fn run() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
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

    info!(
        host = %config.smtp.host,
        port = %config.smtp.port,
        use_tls = %config.smtp.use_tls,
        "Configuring SMTP transport"
    );
    let transport = SmtpTransport::new(config.smtp.clone())?;
    let processor = DeliveryProcessor::new(transport);

    let worker_config = WorkerConfig::from_stream_def::<EmailStream>();
    let worker = StreamWorker::new(
        broker.clone(),
        processor,
        RedisStatusStore::new(results),
        worker_config,
    );

    // Probe endpoints on a side port
    let health_state = HealthState::new(
        broker,
        config.app.name,
        config.app.version,
        EmailStream::STREAM_NAME,
        EmailStream::DLQ_STREAM,
    );
    let probe_router = worker_router(health_state);
    let probe_address = config.probe.address();
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(&probe_address).await {
            Ok(listener) => {
                info!("Probe server listening on {}", probe_address);
                if let Err(e) = axum::serve(listener, probe_router).await {
                    error!(error = %e, "Probe server failed");
                }
            }
            Err(e) => error!(error = %e, address = %probe_address, "Failed to bind probe server"),
        }
    });

    // Flip the shutdown watch on SIGINT/SIGTERM
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    worker.run(shutdown_rx).await?;

    info!("{} shutdown complete", config.app.name);
    Ok(())
}
