//! `GatewayServer`, the Axum HTTP + WebSocket surface.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use futures::TryStreamExt;
use metrics_exporter_prometheus::PrometheusHandle;
use sentinel_core::protocol::{IngestResponse, LogSubmission};
use sentinel_store::CredentialStore;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::GatewayConfig;
use crate::health::{self, HealthResponse};
use crate::ingest::{batch, single};
use crate::metrics as gateway_metrics;
use crate::ratelimit::RateLimiter;
use crate::registry::{self, ConnectionRegistry};
use crate::session::run_session;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential checks and log persistence.
    pub store: Arc<dyn CredentialStore>,
    /// Per-client rate limiter.
    pub limiter: Arc<RateLimiter>,
    /// Live-session registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Prometheus render handle.
    pub metrics: PrometheusHandle,
    /// When the gateway started.
    pub start_time: Instant,
    /// Heartbeat interval for sessions.
    pub heartbeat_interval: Duration,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
}

/// The gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create a server over an already-migrated store.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn CredentialStore>,
        metrics: PrometheusHandle,
    ) -> Self {
        let state = AppState {
            store,
            limiter: Arc::new(RateLimiter::new()),
            registry: Arc::new(ConnectionRegistry::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            metrics,
            start_time: Instant::now(),
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
            max_message_size: config.max_message_size,
        };
        Self { config, state }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/v1/logs", post(single_handler))
            .route("/v1/logs/batch", post(batch_handler))
            .route("/v1/connect", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Spawn the idle-session sweeper tied to the shutdown token.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(registry::run_sweeper(
            Arc::clone(&self.state.registry),
            registry::SWEEP_INTERVAL,
            registry::STALE_AFTER,
            self.state.shutdown.token(),
        ))
    }

    /// Bind the configured address and serve until shutdown is triggered.
    pub async fn listen(&self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an existing listener (tests bind their own port 0).
    pub async fn serve_on(&self, listener: tokio::net::TcpListener) -> std::io::Result<()> {
        info!(addr = %listener.local_addr()?, "gateway listening");
        let token = self.state.shutdown.token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// The session registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.state.registry
    }

    /// The server configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time, state.registry.len()))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    gateway_metrics::render(&state.metrics)
}

/// POST /v1/logs
///
/// Transport status is always 200; the outcome is in the body.
async fn single_handler(
    State(state): State<AppState>,
    Json(submission): Json<LogSubmission>,
) -> Json<IngestResponse> {
    Json(single::process(
        state.store.as_ref(),
        state.limiter.as_ref(),
        &submission,
    ))
}

/// POST /v1/logs/batch
///
/// NDJSON body; abort statuses are 400/401/429/500 with the partial count
/// in the body.
async fn batch_handler(State(state): State<AppState>, body: Body) -> Response {
    let reader = StreamReader::new(body.into_data_stream().map_err(std::io::Error::other));
    let lines = FramedRead::new(reader, LinesCodec::new()).map_err(std::io::Error::other);

    match batch::run_batch(state.store.as_ref(), state.limiter.as_ref(), lines).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(abort) => (abort.status(), Json(abort.response())).into_response(),
    }
}

/// GET /v1/connect — WebSocket upgrade into a persistent session.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| {
            run_session(
                socket,
                Arc::clone(&state.store),
                Arc::clone(&state.limiter),
                Arc::clone(&state.registry),
                state.heartbeat_interval,
                state.shutdown.token(),
            )
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::FakeStore;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn server_with(store: FakeStore) -> GatewayServer {
        GatewayServer::new(
            GatewayConfig::default(),
            Arc::new(store),
            PrometheusBuilder::new().build_recorder().handle(),
        )
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let server = server_with(FakeStore::with_free_account());
        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sessions"], 0);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders() {
        let server = server_with(FakeStore::with_free_account());
        let response = server
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn single_shot_success_is_200() {
        let server = server_with(FakeStore::with_free_account());
        let body = serde_json::json!({
            "project_id": "p1",
            "client_id": "u1",
            "api_key": "secret",
            "category": "info",
            "message": "hello",
        });
        let response = server
            .router()
            .oneshot(
                Request::post("/v1/logs")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Log saved successfully");
    }

    #[tokio::test]
    async fn single_shot_failure_is_still_200() {
        let server = server_with(FakeStore::with_free_account());
        let body = serde_json::json!({
            "project_id": "p1",
            "client_id": "u1",
            "api_key": "wrong",
            "category": "info",
            "message": "hello",
        });
        let response = server
            .router()
            .oneshot(
                Request::post("/v1/logs")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn batch_success_counts_records() {
        let server = server_with(FakeStore::with_free_account());
        let record = serde_json::json!({
            "project_id": "p1",
            "client_id": "u1",
            "api_key": "secret",
            "category": "info",
            "message": "m",
        })
        .to_string();
        let ndjson = format!("{record}\n{record}\n{record}\n");

        let response = server
            .router()
            .oneshot(
                Request::post("/v1/logs/batch")
                    .body(Body::from(ndjson))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 3);
    }

    #[tokio::test]
    async fn batch_auth_failure_is_401() {
        let server = server_with(FakeStore::with_free_account());
        let record = serde_json::json!({
            "project_id": "p1",
            "client_id": "u1",
            "api_key": "wrong",
            "category": "info",
            "message": "m",
        })
        .to_string();

        let response = server
            .router()
            .oneshot(
                Request::post("/v1/logs/batch")
                    .body(Body::from(record))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn websocket_route_rejects_plain_get() {
        let server = server_with(FakeStore::with_free_account());
        let response = server
            .router()
            .oneshot(Request::get("/v1/connect").body(Body::empty()).unwrap())
            .await
            .unwrap();
        // No upgrade headers: not a WebSocket handshake.
        assert_ne!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = server_with(FakeStore::with_free_account());
        let response = server
            .router()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
