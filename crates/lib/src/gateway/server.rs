//! Gateway HTTP server: health probes and the SMAX webhook.

use crate::backend::{DataProvider, DemoDataProvider};
use crate::channels::{SmaxChannel, TransportHeaders};
use crate::config::{self, Config};
use crate::gateway::protocol::{GatewayError, WebhookResponse};
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Command used by `POST /test/webhook`.
const SAMPLE_COMMAND: &str = "báo cáo cuộc gọi hôm nay";

/// Shared state for the gateway (config and the request pipeline).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    /// Shared delivery connector; its HTTP client lives as long as the gateway.
    pub sink: Arc<SmaxChannel>,
}

impl GatewayState {
    /// State backed by the demo data provider.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_provider(config, Arc::new(DemoDataProvider::new()))
    }

    pub fn with_provider(config: Config, provider: Arc<dyn DataProvider>) -> Result<Self> {
        let sink = Arc::new(
            SmaxChannel::new(
                config.sink.url.clone(),
                config.sink.token.clone(),
                Duration::from_secs(config.sink.timeout_secs),
            )
            .context("building delivery client")?,
        );
        let pipeline = Arc::new(Pipeline::new(&config, provider, sink.clone())?);
        Ok(Self {
            config: Arc::new(config),
            pipeline,
            sink,
        })
    }
}

/// Routes: `GET /`, `GET /health`, `POST /webhook/smax`, `POST /test/webhook`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(root_http))
        .route("/health", get(health_http))
        .route("/webhook/smax", post(smax_webhook))
        .route("/test/webhook", post(test_webhook))
        .with_state(state)
}

fn loaded(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "loaded"
    } else {
        "not set"
    }
}

pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) && config.auth.api_key.is_none() {
        log::warn!(
            "gateway bound to {} without an api key; inbound requests are not authenticated",
            bind
        );
    }
    log::info!("assistant id: {}", config.assistant.bot_id);
    log::info!("assistant aliases: {:?}", config.assistant.effective_aliases());
    log::info!("sink url: {}", loaded(&config.sink.url));
    log::info!("sink token: {}", loaded(&config.sink.token));
    log::info!(
        "api key: {} (enforced: {})",
        loaded(&config.auth.api_key),
        config.auth.enforce_credential
    );

    let port = config.gateway.port;
    let state = GatewayState::new(config)?;
    if !state.sink.is_configured() {
        log::warn!("delivery sink not configured; replies will not be forwarded");
    }
    let app = build_router(state);

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped, delivery client closed");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// Advisory unless `auth.enforceCredential` is set.
fn check_credential(
    state: &GatewayState,
    req_id: &str,
    headers: &TransportHeaders,
) -> Result<(), GatewayError> {
    let Some(expected) = state.config.auth.api_key.as_deref() else {
        return Ok(());
    };
    if headers.api_key.as_deref() == Some(expected) {
        return Ok(());
    }
    if state.config.auth.enforce_credential {
        log::warn!("{}: missing or invalid api key, rejecting", req_id);
        return Err(GatewayError::Unauthorized);
    }
    log::warn!("{}: missing or invalid api key, continuing (not enforced)", req_id);
    Ok(())
}

/// Run the pipeline on its own task so a panic surfaces as a 500, not a dropped connection.
async fn run_pipeline(
    state: &GatewayState,
    req_id: String,
    payload: Value,
    headers: TransportHeaders,
) -> Result<Json<WebhookResponse>, GatewayError> {
    let pipeline = state.pipeline.clone();
    let task_id = req_id.clone();
    let task = tokio::spawn(async move { pipeline.handle(&task_id, &payload, &headers).await });
    match task.await {
        Ok(outcome) => Ok(Json(outcome.into())),
        Err(e) => {
            log::error!("{}: pipeline task failed: {}", req_id, e);
            Err(GatewayError::Internal)
        }
    }
}

/// POST /webhook/smax handles one inbound chat event and returns the reply with its delivery status.
async fn smax_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, GatewayError> {
    let req_id = format!("req-{}", uuid::Uuid::new_v4());
    let transport = TransportHeaders::from_header_map(&headers);
    check_credential(&state, &req_id, &transport)?;
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("{}: malformed webhook body: {}", req_id, e);
        GatewayError::MalformedBody
    })?;
    if !payload.is_object() {
        log::warn!("{}: webhook body is not a JSON object", req_id);
        return Err(GatewayError::MalformedBody);
    }
    log::info!("{}: webhook received ({} bytes)", req_id, body.len());
    run_pipeline(&state, req_id, payload, transport).await
}

/// Sample event tagging the configured assistant.
fn sample_event(config: &Config) -> Value {
    let name = config.assistant.display_name.trim();
    let tag = format!("@{}", name);
    json!({
        "event_type": "message_received",
        "data": {
            "message_id": "test_123",
            "user_id": "user_456",
            "display_name": "Test User"
        },
        "raw": {
            "message": format!("{} {}", tag, SAMPLE_COMMAND),
            "mentions": [{
                "user_id": config.assistant.bot_id,
                "display_name": name,
                "start": 0,
                "end": tag.chars().count()
            }]
        }
    })
}

/// POST /test/webhook runs the pipeline on a built-in sample event.
async fn test_webhook(
    State(state): State<GatewayState>,
) -> Result<Json<WebhookResponse>, GatewayError> {
    let req_id = format!("req-{}", uuid::Uuid::new_v4());
    log::info!("{}: running sample event", req_id);
    let payload = sample_event(&state.config);
    run_pipeline(&state, req_id, payload, TransportHeaders::default()).await
}

/// GET / returns a simple status JSON.
async fn root_http() -> Json<Value> {
    Json(json!({
        "message": "Biva bot is running!",
        "status": "active",
    }))
}

/// GET /health returns a health JSON (for probes).
async fn health_http() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
