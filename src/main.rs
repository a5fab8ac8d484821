use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webook_search::{
    api::{build_router, AppState},
    config::{Config, ObservabilityConfig},
    messaging::{init_messaging_metrics, MessageConsumer, MessageProducer, MessagingService},
    search::{init_search_metrics, SearchModule},
};

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "webook_search={},tower_http={}",
            observability.log_level, observability.log_level
        )
        .into()
    });

    if observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config.observability);

    tracing::info!("Starting webook-search v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        init_search_metrics();
        init_messaging_metrics();
        tracing::info!("✅ Prometheus metrics initialized");
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Connect to the message bus
    let messaging = Arc::new(MessagingService::new(config.messaging.clone()).await?);
    tracing::info!(backend = messaging.backend().as_str(), "✅ Messaging connected");

    let consumer: Arc<dyn MessageConsumer> = messaging.clone();
    let dead_letters: Arc<dyn MessageProducer> = messaging;

    // Wire the search module
    let module = SearchModule::new(&config.search, config.sync.clone(), consumer, dead_letters)?;

    // Indexes must exist before anything reads or writes them
    let report = module.bootstrap().await.map_err(|e| {
        tracing::error!(error = %e, "Index bootstrap failed");
        e
    })?;
    tracing::info!(
        created = ?report.created,
        existing = ?report.existing,
        "✅ Indexes ready"
    );

    // Start the sync consumer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut consumer_handle = module.consumer.clone().start(shutdown_rx);
    tracing::info!(topic = %config.sync.topic, "✅ Sync consumer started");

    // Build HTTP router
    let app = build_router(AppState::from_module(&module));

    let http_addr = config.server.http_addr();
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Search: http://{}/search/list", http_addr);
    tracing::info!("   Metrics: http://{}/metrics", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let mut server_shutdown = shutdown_tx.subscribe();
    let http_handle = tokio::spawn(async move {
        let graceful = async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        };
        if let Err(e) = axum::serve(http_listener, app)
            .with_graceful_shutdown(graceful)
            .await
        {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    // Stop on Ctrl+C, or when the consumer gives up
    let consumer_outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutdown signal received");
            None
        }
        outcome = &mut consumer_handle => Some(outcome),
    };

    tracing::info!("Shutting down gracefully...");
    let _ = shutdown_tx.send(true);

    let consumer_outcome = match consumer_outcome {
        Some(outcome) => outcome,
        None => consumer_handle.await,
    };
    let consumer_result = match consumer_outcome {
        Ok(Ok(())) => {
            tracing::info!("Sync consumer stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Sync consumer failed");
            Err(anyhow::Error::new(e))
        }
        Err(e) => {
            tracing::error!(error = %e, "Sync consumer task panicked");
            Err(anyhow::Error::new(e))
        }
    };
    if let Err(e) = http_handle.await {
        tracing::error!(error = %e, "HTTP server task panicked");
    }

    consumer_result
}
