//! Gateway entry point.

use std::process::ExitCode;

use api::config::{Config, LogFormat};
use clients::{
    HttpInventoryService, HttpRatingService, HttpReservationService, ServiceClient,
    build_http_client,
};
use message_bus::InMemoryMessageBus;
use saga::RetryDispatcher;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Probes every downstream service; the gateway does not start without them.
async fn probe(services: [&ServiceClient; 3]) -> bool {
    let mut healthy = true;
    for service in services {
        match service.health_check().await {
            Ok(()) => tracing::info!(service = service.name(), url = service.base_url(), "service reachable"),
            Err(e) => {
                tracing::error!(service = service.name(), url = service.base_url(), error = %e, "service unreachable");
                healthy = false;
            }
        }
    }
    healthy
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "gateway stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 2. Downstream clients, checked before accepting traffic
    let http = build_http_client(config.request_timeout)?;
    let inventory = HttpInventoryService::new(&config.library_address, http.clone());
    let reservations = HttpReservationService::new(&config.reservation_address, http.clone());
    let rating = HttpRatingService::new(&config.rating_address, http);

    if !probe([inventory.service(), reservations.service(), rating.service()]).await {
        return Err("downstream services unavailable".into());
    }

    // 3. Retry channel and its dispatchers
    let bus = InMemoryMessageBus::new();
    let shutdown = CancellationToken::new();
    let workers = RetryDispatcher::new(inventory.clone(), rating.clone(), bus.clone(), shutdown.clone())
        .with_delay(config.retry_delay)
        .spawn()
        .await?;

    // 4. Build the application
    let state = api::create_state(inventory, reservations, rating, bus.clone());
    let app = api::create_app(state, metrics_handle, config.request_timeout);

    // 5. Serve until signalled
    let addr = config.addr();
    tracing::info!(%addr, "starting gateway");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. Stop the dispatchers once in-flight requests have drained
    bus.close().await;
    shutdown.cancel();
    workers.join().await;

    tracing::info!("gateway shut down gracefully");
    Ok(())
}
