use crate::{
    axum_http::{
        default_routers,
        routers::{self, payment_webhooks::WebhookResponse},
    },
    config::config_model::{BackendServer, DotEnvyConfig},
    usecases::payment_webhooks::PaymentWebhookUseCase,
};
use anyhow::Result;
use axum::{
    Json, Router,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use crates::domain::repositories::{
    entitlement_store::EntitlementStore, payment_gateways::GooglePlayGateway,
};
use std::{any::Any, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

pub fn app<S, G>(server: &BackendServer, usecase: Arc<PaymentWebhookUseCase<S, G>>) -> Result<Router>
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized + 'static,
{
    Ok(Router::new()
        .fallback(default_routers::not_found)
        .merge(routers::payment_webhooks::routes(usecase))
        .route("/health-check", get(default_routers::health_check))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(Duration::from_secs(server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(middleware::map_response(webhook_envelope))
        .layer(
            // Providers call server to server; no browser origin is expected.
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([CONTENT_TYPE])
                .allow_origin(AnyOrigin),
        )
        .layer(TraceLayer::new_for_http()))
}

pub async fn start<S, G>(
    config: Arc<DotEnvyConfig>,
    usecase: Arc<PaymentWebhookUseCase<S, G>>,
) -> Result<()>
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized + 'static,
{
    let app = app(&config.backend_server, usecase)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// A panicking handler still answers 200 so the provider does not redeliver.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "http_serve: handler panicked");

    (
        StatusCode::OK,
        Json(WebhookResponse::failed("internal error")),
    )
        .into_response()
}

/// Timeouts and oversized bodies also answer 200 with a failed envelope.
async fn webhook_envelope(response: Response) -> Response {
    let message = match response.status() {
        StatusCode::REQUEST_TIMEOUT => "request timed out",
        StatusCode::PAYLOAD_TOO_LARGE => "payload too large",
        _ => return response,
    };
    warn!(status = %response.status(), "http_serve: {}", message);

    (StatusCode::OK, Json(WebhookResponse::failed(message))).into_response()
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
