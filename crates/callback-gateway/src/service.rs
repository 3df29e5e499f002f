//! Callback gateway service: router and server lifecycle.

use crate::controller::{CallbackHandshakeController, PlainReply, ACK_BODY, GREETING_BODY};
use crate::domain::config::GatewayConfig;
use crate::domain::error::{GatewayError, HandshakeError};
use crate::domain::types::{EncryptedQuery, PlainQuery};
use crate::middleware::{CallbackMetrics, TracingLayer};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, DefaultBodyLimit, Query, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

/// Callback gateway service state
pub struct CallbackGatewayService {
    config: GatewayConfig,
    controller: Arc<CallbackHandshakeController>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl CallbackGatewayService {
    /// Create a new callback gateway service
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;

        let metrics = Arc::new(CallbackMetrics::new());
        let controller = Arc::new(CallbackHandshakeController::from_credentials(
            &config.credentials,
            metrics,
        )?);

        Ok(Self {
            config,
            controller,
            shutdown_tx: None,
            server: None,
        })
    }

    /// Bind and serve in the background. Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr, GatewayError> {
        if self.server.is_some() {
            return Err(GatewayError::AlreadyStarted);
        }

        let addr = self.config.http_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let router = self.router();
        info!(
            addr = %local_addr,
            plain = %self.config.routes.plain_path,
            encrypted = %self.config.routes.encrypted_path,
            "Callback gateway listening"
        );

        self.server = Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        }));

        Ok(local_addr)
    }

    /// Wait for the server task to finish.
    pub async fn wait(&mut self) -> Result<(), GatewayError> {
        let Some(handle) = self.server.as_mut() else {
            return Ok(());
        };

        let result = handle.await;
        self.server = None;

        match result {
            Ok(Ok(())) => {
                info!("Callback gateway stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "HTTP server error");
                Err(GatewayError::Internal(e.to_string()))
            }
            Err(e) => Err(GatewayError::Internal(e.to_string())),
        }
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            info!("Shutting down callback gateway");
            let _ = tx.send(());
        }
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<CallbackMetrics> {
        Arc::clone(self.controller.metrics())
    }

    /// Get the shared controller
    pub fn controller(&self) -> Arc<CallbackHandshakeController> {
        Arc::clone(&self.controller)
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        build_router(&self.config, Arc::clone(&self.controller))
    }
}

#[derive(Clone)]
struct AppState {
    controller: Arc<CallbackHandshakeController>,
}

/// Build the callback router with its middleware stack.
pub fn build_router(config: &GatewayConfig, controller: Arc<CallbackHandshakeController>) -> Router {
    let metrics = Arc::clone(controller.metrics());
    let state = AppState { controller };

    let middleware = ServiceBuilder::new()
        .layer(TracingLayer::new(metrics))
        .layer(TimeoutLayer::new(config.limits.request_timeout));

    Router::new()
        .route(
            &config.routes.plain_path,
            get(plain_verify).post(plain_receive),
        )
        .route(
            &config.routes.encrypted_path,
            get(encrypted_verify).post(encrypted_receive),
        )
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_json))
        .layer(DefaultBodyLimit::max(config.limits.max_body_size))
        .layer(middleware)
        .with_state(state)
}

async fn plain_verify(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    query: Result<Query<PlainQuery>, QueryRejection>,
) -> Response {
    if raw.as_deref().map_or(true, str::is_empty) {
        return GREETING_BODY.into_response();
    }

    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable plain query");
            return rejection.body_text().into_response();
        }
    };

    // Plain mode reports every failure with 200
    match state.controller.verify_plain(&query) {
        Ok(body) => body.into_response(),
        Err(e) => {
            warn!(error = %e, "Plain handshake failed");
            state.controller.metrics().record_failure(&e);
            e.to_string().into_response()
        }
    }
}

async fn plain_receive(State(state): State<AppState>, body: Bytes) -> Response {
    let body = String::from_utf8_lossy(&body);
    match state.controller.receive_plain(&body) {
        PlainReply::Xml(xml) => ([(header::CONTENT_TYPE, "application/xml")], xml).into_response(),
        PlainReply::Ack => ACK_BODY.into_response(),
    }
}

async fn encrypted_verify(
    State(state): State<AppState>,
    query: Result<Query<EncryptedQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return unexpected(&state, rejection.body_text()),
    };

    match state.controller.verify_encrypted(&query) {
        Ok(plain) => plain.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn encrypted_receive(
    State(state): State<AppState>,
    query: Result<Query<EncryptedQuery>, QueryRejection>,
    body: Bytes,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return unexpected(&state, rejection.body_text()),
    };

    let body = match std::str::from_utf8(&body) {
        Ok(body) => body,
        Err(e) => {
            let err = HandshakeError::InvalidMessage {
                reason: e.to_string(),
            };
            state.controller.metrics().record_failure(&err);
            return err.into_response();
        }
    };

    match state.controller.receive_encrypted(&query, body) {
        Ok(_) => ACK_BODY.into_response(),
        Err(e) => e.into_response(),
    }
}

fn unexpected(state: &AppState, text: String) -> Response {
    warn!(error = %text, "Unreadable encrypted query");
    let err = HandshakeError::Unexpected(text);
    state.controller.metrics().record_failure(&err);
    err.into_response()
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "callback-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_json(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.controller.metrics().to_json()))
}
