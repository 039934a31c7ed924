//! HTTP server serving the combined usage document.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};
use usagewatch_store::{RefreshCadence, StoreError, UsageStore};

/// Seconds a client should wait before retrying an incomplete response.
pub const RETRY_AFTER_SECS: u64 = 60;

// ============================================================================
// State
// ============================================================================

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    store: UsageStore,
    cadence: RefreshCadence,
    version: Arc<str>,
}

impl AppState {
    /// Creates handler state.
    pub fn new(store: UsageStore, cadence: RefreshCadence, version: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            cadence,
            version: version.into(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_usage))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
}

/// `GET /` - both providers' latest usage.
///
/// Every request pulls the refresh cadence back to its minimum. Until both
/// providers have been fetched once the missing slot is `null` and the
/// status is 503.
async fn get_usage(State(state): State<AppState>) -> Response {
    let usage = state.store.combined(&state.version).await;
    state.cadence.reset_to_minimum();

    let missing = usage.missing();
    if missing.is_empty() {
        return (StatusCode::OK, Json(usage)).into_response();
    }

    for provider in missing {
        let err = StoreError::StaleData(provider);
        warn!(provider = %provider, error = %err, "Serving incomplete usage");
    }

    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
        Json(usage),
    )
        .into_response()
}

/// Logs method, path, status and duration of every request.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis(),
        "Request handled"
    );
    response
}

// ============================================================================
// Serve
// ============================================================================

/// Serves the router on `0.0.0.0:port` until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(port: u16, app: Router) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use usagewatch_core::{ProviderKind, UsageSnapshot};
    use usagewatch_store::{DEFAULT_MAX_TICKS, RefreshPolicy};

    fn test_state(policy: RefreshPolicy) -> (AppState, UsageStore, RefreshCadence) {
        let store = UsageStore::new();
        let cadence = RefreshCadence::new(policy);
        (
            AppState::new(store.clone(), cadence.clone(), "1.4.0"),
            store,
            cadence,
        )
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_both_present() {
        let (state, store, _) = test_state(RefreshPolicy::Adaptive);
        store
            .set_snapshot(
                ProviderKind::IiNet,
                UsageSnapshot::from_counts(5_000_000, 2_500_000, 12).unwrap(),
            )
            .await;
        store
            .set_snapshot(
                ProviderKind::Vodafone,
                UsageSnapshot::from_counts(40, 10, 3).unwrap(),
            )
            .await;

        let response = get(router(state), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(json["version"], "1.4.0");
        assert_eq!(json["data"]["internet"]["quota"], 5_000_000);
        assert_eq!(json["data"]["internet"]["remaining"], 2_500_000);
        assert_eq!(json["data"]["internet"]["percent_used"], 50.0);
        assert_eq!(json["data"]["mobile"]["used"], 10);
        assert_eq!(json["data"]["mobile"]["days_remaining"], 3);
    }

    #[tokio::test]
    async fn test_missing_provider_is_unavailable() {
        let (state, store, _) = test_state(RefreshPolicy::Adaptive);
        store
            .set_snapshot(
                ProviderKind::IiNet,
                UsageSnapshot::from_counts(100, 1, 1).unwrap(),
            )
            .await;

        let response = get(router(state), "/").await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
        let json = body_json(response).await;
        assert_eq!(json["data"]["internet"]["used"], 1);
        assert!(json["data"]["mobile"].is_null());
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (state, _, _) = test_state(RefreshPolicy::Adaptive);

        let response = get(router(state), "/").await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert!(json["data"]["internet"].is_null());
        assert!(json["data"]["mobile"].is_null());
        assert_eq!(json["version"], "1.4.0");
    }

    #[tokio::test]
    async fn test_request_resets_cadence() {
        let (state, _, cadence) = test_state(RefreshPolicy::Adaptive);
        cadence.mark_refreshed(ProviderKind::IiNet);
        cadence.mark_refreshed(ProviderKind::Vodafone);
        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(DEFAULT_MAX_TICKS));

        get(router(state), "/").await;

        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(15));
        assert_eq!(cadence.ticks_until_due(ProviderKind::Vodafone), Some(30));
    }

    #[tokio::test]
    async fn test_fixed_policy_ignores_requests() {
        let (state, _, cadence) = test_state(RefreshPolicy::Fixed);
        cadence.mark_refreshed(ProviderKind::IiNet);
        for _ in 0..5 {
            cadence.on_tick(ProviderKind::IiNet);
        }

        get(router(state), "/").await;

        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(15));
        assert_eq!(cadence.ticks_since_refresh(ProviderKind::IiNet), Some(5));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (state, _, _) = test_state(RefreshPolicy::Adaptive);
        let response = get(router(state), "/metrics").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
