//! HTTP listen loop with graceful shutdown.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::{
    http::{header, HeaderName, HeaderValue, Method, Request},
    Router,
};
use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use unitrace_id::TraceId;

use crate::request_context::REQUEST_ID_HEADER;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Fills in a missing `x-request-id` with a fresh [`TraceId`].
#[derive(Debug, Clone, Copy, Default)]
struct MakeTraceId;

impl MakeRequestId for MakeTraceId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&TraceId::new().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Wraps a service router with the middleware every service carries.
///
/// Every request leaves with an `x-request-id`, the caller's or a new one,
/// and the response echoes it.
pub fn with_middleware(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .allow_origin(Any);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeTraceId))
        .layer(cors)
}

/// Serves `app` on `listen_addr` until Ctrl+C or until `shutdown_tx` is
/// flipped to `true` by the caller.
pub async fn serve(
    listen_addr: SocketAddr,
    app: Router,
    shutdown_tx: watch::Sender<bool>,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = %listen_addr, "Listening for connections");

    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server_handle).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("HTTP server did not drain in time");
                    return Ok(());
                }
            }
        }
        result = &mut server_handle => result,
    };

    match result {
        Ok(Ok(())) => info!("Server exited normally"),
        Ok(Err(e)) => error!(error = %e, "Server error"),
        Err(e) => error!(error = %e, "Server task panicked"),
    }

    Ok(())
}
