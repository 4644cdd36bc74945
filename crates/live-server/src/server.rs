//! `LiveServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::errors::LiveError;
use crate::health::{self, HealthResponse};
use crate::ingress::LiveActivity;
use crate::metrics::WS_CONNECTIONS_REJECTED_TOTAL;
use crate::routes;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::connection::ClientConnection;
use crate::websocket::session::{HeartbeatConfig, run_ws_session};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Presence and fan-out.
    pub live: Arc<LiveActivity>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Stop signal for sessions.
    pub shutdown: CancellationToken,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// One permit per channel allowed by `max_connections`.
    pub connection_slots: Arc<Semaphore>,
}

/// The live-activity server.
pub struct LiveServer {
    config: Arc<ServerConfig>,
    live: Arc<LiveActivity>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
    connection_slots: Arc<Semaphore>,
}

impl LiveServer {
    /// Create a server.
    ///
    /// Fails on a config the runtime cannot honor: see
    /// [`ServerConfig::validate`] and [`crate::presence::PresenceTracker::new`].
    pub fn new(
        config: ServerConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, LiveError> {
        config.validate()?;
        let live = LiveActivity::with_window(config.presence_window())?;
        let slots = config.max_connections.min(Semaphore::MAX_PERMITS);
        Ok(Self {
            config: Arc::new(config),
            live: Arc::new(live),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics,
            connection_slots: Arc::new(Semaphore::new(slots)),
        })
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            live: self.live.clone(),
            config: self.config.clone(),
            shutdown: self.shutdown.token(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
            connection_slots: self.connection_slots.clone(),
        };

        Router::new()
            .route("/api/health", get(health_handler))
            .route("/api/analytics/track", post(routes::track_action))
            .route("/api/analytics/events", post(routes::domain_event))
            .route("/api/analytics/active-users", get(routes::active_users))
            .route("/metrics", get(metrics_handler))
            .route(&self.config.ws_path, get(ws_handler))
            .with_state(state)
            .layer(cors_layer(&self.config.allowed_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve in the background.
    ///
    /// Returns the bound address and the server task. The task finishes once
    /// [`ShutdownCoordinator::shutdown`] is called and in-flight HTTP
    /// requests drain.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, ws_path = %self.config.ws_path, "live server listening");

        let router = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = served {
                error!(error = %e, "server error");
            }
        });
        Ok((local_addr, handle))
    }

    /// Presence and fan-out.
    pub fn live(&self) -> &Arc<LiveActivity> {
        &self.live
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// GET /api/health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.live.registry().count(),
        state.live.active_count(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Claim a channel slot. The permit is held until the session ends, or
/// released at once if the upgrade never completes.
fn reserve_slot(state: &AppState) -> Option<OwnedSemaphorePermit> {
    state.connection_slots.clone().try_acquire_owned().ok()
}

/// GET {ws_path}: upgrade to an observer channel.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let Some(slot) = reserve_slot(&state) else {
        counter!(WS_CONNECTIONS_REJECTED_TOTAL).increment(1);
        warn!(
            open = state.live.registry().count(),
            max = state.config.max_connections,
            "connection limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "too many connections").into_response();
    };

    let heartbeat = HeartbeatConfig {
        interval: state.config.heartbeat_interval(),
        timeout: state.config.heartbeat_timeout(),
    };
    let (connection, outbound) = ClientConnection::channel(state.config.send_queue_capacity);
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            let _ = run_ws_session(
                socket,
                connection,
                outbound,
                state.live,
                heartbeat,
                state.shutdown,
            )
            .await;
            drop(slot);
        })
}
