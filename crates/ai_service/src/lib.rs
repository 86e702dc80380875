//! PSP risk predictor service
//!
//! Serves failure probabilities for candidate PSP routings over HTTP and
//! routes transactions away from PSPs that are likely to fail them. The
//! model and its column list are loaded once into an immutable
//! [`PredictorContext`] before the listener binds.

pub mod config;
pub mod errors;
pub mod psp;
pub mod routing;
pub mod server;
pub mod service;

pub use config::{ConfigOverrides, LogFormat, ServiceConfig, ENV_PREFIX};
pub use errors::{Result, ServiceError};
pub use psp::{
    build_psp_router, PspHealth, PspNetwork, PspResponse, PspSimulator, DEFAULT_BASE_FAIL,
};
pub use routing::{
    choose_backup, choose_route, route_transaction, PspOutcome, RouteDecision, RouteResponse,
    BACKUP_PREFERENCE, DEFAULT_PSP, REROUTE_THRESHOLD,
};
pub use server::{
    bind_listener, build_router, build_router_with_psps, serve_router, start_server,
    SharedContext,
};
pub use service::{round_probability, HealthStatus, Prediction, PredictorContext};

/// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
