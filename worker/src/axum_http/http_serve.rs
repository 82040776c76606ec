use crate::{axum_http::default_routers, config::config_model::WorkerServer};
use anyhow::Result;
use axum::{Router, routing::get};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

pub fn app(server: &WorkerServer) -> Result<Router> {
    Ok(Router::new()
        .fallback(default_routers::not_found)
        .route("/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(TraceLayer::new_for_http()))
}

pub async fn start(server: WorkerServer) -> Result<()> {
    let app = app(&server)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Worker HTTP server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = ?err, "http_serve: failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = ?err, "http_serve: failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
