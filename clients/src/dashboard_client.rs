use anyhow::Result;
use std::sync::Arc;
use tokio::signal;

mod dashboard_logic;
use dashboard_logic::{config, console, logger};

use lib_dashboard::core::SessionController;
use lib_dashboard::retrieve::HttpGateway;
use lib_dashboard::transport::StompConnector;

#[tokio::main]
async fn main() -> Result<()> {
    // Explicitly install the default crypto provider for rustls (wss:// brokers)
    let _ = rustls::crypto::ring::default_provider().install_default();
    dotenvy::dotenv().ok();

    let config = config::load_config();
    logger::setup_logging(&config.log_dir(), config.log_level())?;

    let session_config = config.session_config();
    log::info!(
        "Starting dashboard client (events: {}, api: {})",
        session_config.event_url,
        session_config.api_base_url
    );

    let connector = StompConnector::from_config(&session_config)?;
    let gateway = HttpGateway::from_config(&session_config)?;
    match gateway.health().await {
        Ok(health) => log::info!("Order service health: {:?}", health),
        Err(e) => log::warn!("Order service health check failed: {}", e),
    }

    let session = Arc::new(SessionController::new(&session_config, connector, gateway));
    session.start().await;
    log::info!("Initial statistics: {:?}", session.view().statistics);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let mut console_handle = tokio::spawn(console::run(Arc::clone(&session), shutdown_tx.subscribe()));

    // Wait for a shutdown signal or for the user to quit
    let signalled = tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
            true
        }
        _ = terminate() => {
            log::info!("SIGTERM received, initiating shutdown.");
            true
        }
        _ = &mut console_handle => {
            log::info!("Console closed, initiating shutdown.");
            false
        }
    };

    let _ = shutdown_tx.send(());
    session.shutdown();
    if signalled {
        let _ = console_handle.await;
        log::info!("Shutdown complete.");
        // The console's pending stdin read cannot be cancelled and would block runtime shutdown.
        std::process::exit(0);
    }

    log::info!("Shutdown complete.");
    Ok(())
}

async fn terminate() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        // On non-unix platforms, just wait forever.
        std::future::pending::<()>().await;
    }
}
