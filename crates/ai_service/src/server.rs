use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use psp_types::Transaction;
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::psp::PspNetwork;
use crate::routing::{route_transaction, RouteResponse};
use crate::service::{HealthStatus, Prediction, PredictorContext};

pub type SharedContext = Arc<PredictorContext>;

#[derive(Clone)]
struct AppState {
    predictor: SharedContext,
    psps: Arc<PspNetwork>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

/// Bind `addr` and serve the predictor until Ctrl-C.
pub async fn start_server(context: SharedContext, addr: &str) -> Result<()> {
    serve_router(build_router(context), addr).await
}

/// Bind `addr` and serve `app` until Ctrl-C.
pub async fn serve_router(app: Router, addr: &str) -> Result<()> {
    let listener = bind_listener(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}

pub async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind predictor listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind predictor listener on {addr}"))
    }
}

/// Predictor routes, with `/route` dispatching to the default simulated PSPs.
pub fn build_router(context: SharedContext) -> Router {
    build_router_with_psps(context, PspNetwork::default())
}

pub fn build_router_with_psps(context: SharedContext, psps: PspNetwork) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .route("/route", post(handle_route))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            predictor: context,
            psps: Arc::new(psps),
        })
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.predictor.health())
}

async fn handle_predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<Prediction>, ApiError> {
    let txn = request_transaction(payload)?;
    Ok(Json(state.predictor.predict(&txn)))
}

async fn handle_route(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<RouteResponse>, ApiError> {
    let txn = request_transaction(payload)?;
    let response = route_transaction(&state.predictor, &state.psps, txn, &mut rand::thread_rng());
    Ok(Json(response))
}

pub(crate) fn request_transaction(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Transaction, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(status = %rejection.status(), "rejected request");
        ApiError::from(rejection)
    })?;
    parse_transaction(body)
}

/// Accept only a JSON object as a transaction.
pub(crate) fn parse_transaction(body: Value) -> std::result::Result<Transaction, ApiError> {
    if !body.is_object() {
        warn!("rejected request: body is not a JSON object");
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "request body must be a JSON object",
        ));
    }
    serde_json::from_value(body)
        .map_err(|err| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
