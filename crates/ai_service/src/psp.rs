//! Simulated PSP endpoints
//!
//! Each simulated PSP fails a transaction with probability
//! `base_fail + 0.0001 * amount + 0.001 * latency / 100`. The router calls the
//! simulators in process; `psp-sim` serves a single one over HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use psp_types::{PaymentStatus, Transaction, DEFAULT_NETWORK_LATENCY_MS, PSP_PROFILES};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::server::{request_transaction, ApiError};

/// Base failure rate of a simulator started without one.
pub const DEFAULT_BASE_FAIL: f64 = 0.03;

const PROBABILITY_SCALE: f64 = 10_000.0;

/// Response body of `/process`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PspResponse {
    pub txn_id: Option<String>,
    pub status: PaymentStatus,
    pub psp_fail_prob: f64,
}

/// Response body of the simulator's `/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PspHealth {
    pub status: String,
    pub base_fail: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PspSimulator {
    base_fail: f64,
}

impl Default for PspSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_FAIL)
    }
}

impl PspSimulator {
    pub fn new(base_fail: f64) -> Self {
        Self { base_fail }
    }

    pub fn base_fail(&self) -> f64 {
        self.base_fail
    }

    /// Unclamped failure probability; a zero latency reads as the default.
    pub fn failure_probability(&self, txn: &Transaction) -> f64 {
        let latency = if txn.network_latency_ms == 0.0 {
            DEFAULT_NETWORK_LATENCY_MS
        } else {
            txn.network_latency_ms
        };
        self.base_fail + 0.0001 * txn.amount + 0.001 * (latency / 100.0)
    }

    pub fn process<R: Rng + ?Sized>(&self, txn: &Transaction, rng: &mut R) -> PspResponse {
        let prob = self.failure_probability(txn);
        let status = if rng.gen::<f64>() > prob {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failure
        };
        debug!(txn_id = ?txn.txn_id, %status, prob, "psp processed transaction");
        PspResponse {
            txn_id: txn.txn_id.clone(),
            status,
            psp_fail_prob: (prob * PROBABILITY_SCALE).round() / PROBABILITY_SCALE,
        }
    }

    pub fn health(&self) -> PspHealth {
        PspHealth {
            status: "ok".to_string(),
            base_fail: self.base_fail,
        }
    }
}

/// The simulated PSPs reachable by name from the router.
#[derive(Debug, Clone, PartialEq)]
pub struct PspNetwork {
    simulators: BTreeMap<String, PspSimulator>,
}

impl Default for PspNetwork {
    /// One simulator per known PSP, at that PSP's base failure rate.
    fn default() -> Self {
        Self::new(
            PSP_PROFILES
                .iter()
                .map(|profile| (profile.name.to_string(), PspSimulator::new(profile.base_fail))),
        )
    }
}

impl PspNetwork {
    pub fn new<I: IntoIterator<Item = (String, PspSimulator)>>(simulators: I) -> Self {
        Self {
            simulators: simulators.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PspSimulator> {
        self.simulators.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.simulators.keys().map(String::as_str)
    }
}

pub fn build_psp_router(simulator: PspSimulator) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/process", post(handle_process))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(simulator))
}

async fn handle_health(State(simulator): State<Arc<PspSimulator>>) -> Json<PspHealth> {
    Json(simulator.health())
}

async fn handle_process(
    State(simulator): State<Arc<PspSimulator>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<PspResponse>, ApiError> {
    let txn = request_transaction(payload)?;
    Ok(Json(simulator.process(&txn, &mut rand::thread_rng())))
}
