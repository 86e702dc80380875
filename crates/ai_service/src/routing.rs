//! PSP routing decision
//!
//! A transaction goes to its candidate PSP unless the predicted failure
//! probability is above [`REROUTE_THRESHOLD`], in which case it moves to the
//! first backup in [`BACKUP_PREFERENCE`] that differs from the candidate.

use std::time::{SystemTime, UNIX_EPOCH};

use psp_types::Transaction;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::psp::{PspNetwork, PspResponse};
use crate::service::PredictorContext;

/// Predicted failure probability above which a transaction is re-routed.
pub const REROUTE_THRESHOLD: f64 = 0.6;

/// PSP used when the request names none.
pub const DEFAULT_PSP: &str = "Axis_PSP";

pub const BACKUP_PREFERENCE: [&str; 3] = ["HDFC_PSP", "SBI_PSP", "Axis_PSP"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub initial_psp: String,
    pub routed_to: String,
}

impl RouteDecision {
    pub fn rerouted(&self) -> bool {
        self.initial_psp != self.routed_to
    }
}

/// First preferred backup other than `primary`.
pub fn choose_backup(primary: &str) -> &str {
    BACKUP_PREFERENCE
        .iter()
        .copied()
        .find(|&candidate| candidate != primary)
        .unwrap_or(primary)
}

/// Route to `psp_candidate` (or [`DEFAULT_PSP`] when absent or empty) unless
/// `failure_probability` exceeds [`REROUTE_THRESHOLD`].
pub fn choose_route(psp_candidate: Option<&str>, failure_probability: f64) -> RouteDecision {
    let initial = psp_candidate
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_PSP);
    let routed_to = if failure_probability > REROUTE_THRESHOLD {
        choose_backup(initial)
    } else {
        initial
    };
    RouteDecision {
        initial_psp: initial.to_string(),
        routed_to: routed_to.to_string(),
    }
}

/// What the chosen PSP answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PspOutcome {
    Processed(PspResponse),
    Unreachable { error: String },
}

/// Response body of `/route`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub txn_id: String,
    pub predicted_fail_prob: f64,
    pub initial_psp: String,
    pub routed_to: String,
    pub psp_response: PspOutcome,
}

/// Score `txn`, pick a PSP and submit the transaction to it.
///
/// A missing `txn_id` is replaced with `txn-<unix millis>`. A PSP that is not
/// part of `psps` yields [`PspOutcome::Unreachable`].
pub fn route_transaction<R: Rng + ?Sized>(
    predictor: &PredictorContext,
    psps: &PspNetwork,
    mut txn: Transaction,
    rng: &mut R,
) -> RouteResponse {
    let txn_id = txn
        .txn_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generated_txn_id);
    txn.txn_id = Some(txn_id.clone());

    let score = predictor.predict(&txn).failure_probability;
    let decision = choose_route(txn.psp_candidate.as_deref(), score);

    let psp_response = match psps.get(&decision.routed_to) {
        Some(simulator) => PspOutcome::Processed(simulator.process(&txn, rng)),
        None => PspOutcome::Unreachable {
            error: "psp_unreachable".to_string(),
        },
    };

    info!(
        txn_id = %txn_id,
        score,
        initial_psp = %decision.initial_psp,
        routed_to = %decision.routed_to,
        rerouted = decision.rerouted(),
        "routed transaction"
    );

    RouteResponse {
        txn_id,
        predicted_fail_prob: score,
        initial_psp: decision.initial_psp,
        routed_to: decision.routed_to,
        psp_response,
    }
}

fn generated_txn_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("txn-{millis}")
}
