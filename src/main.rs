use accounts::config::Configuration;
use accounts::{app, initialize_state, telemetry};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::signal;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let config = Configuration::default().path_from_env().read()?;

    telemetry::setup_logging(&config.log_level, config.log_format)?;
    if config.is_fallback() {
        tracing::warn!(
            path = %config.file_path().display(),
            "configuration file not found, using defaults"
        );
    }
    let metrics = telemetry::setup_metrics_recorder()?;

    let state = initialize_state(config.clone()).await?;

    let app = app(state).route(
        "/metrics",
        get(move || std::future::ready(metrics.render())),
    );

    let listener = TcpListener::bind(&config.address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        version = config.version(),
        "server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
