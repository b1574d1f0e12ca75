//! Server setup and lifecycle management

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::{build_router, ServiceState};

/// Bind, serve until Ctrl+C or SIGTERM, then drain in-flight requests.
pub async fn serve(config: AppConfig) -> Result<(), ServiceError> {
    let addr = config.server.listen_addr;
    let state = ServiceState::bootstrap(config)?;

    info!(
        platform_backend = state.gate.identity_backend(),
        url_policy = state.config.form.url_policy.as_str(),
        submitter = state.submitter.name(),
        "clip maker configured"
    );

    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("clipmaker-service listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("clipmaker-service shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("received terminate signal, initiating graceful shutdown");
        }
    }
}
