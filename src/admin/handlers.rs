use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::monitor::StatusSnapshot;
use crate::status::ConnectivityStatus;

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: ConnectivityStatus,
    pub online: bool,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<StatusSnapshot> {
    Json(state.monitor.snapshot())
}

pub async fn check_now(State(state): State<AdminState>) -> Json<CheckResult> {
    let status = state.monitor.check_once().await;
    Json(CheckResult {
        status,
        online: status.is_online(),
    })
}

pub async fn get_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}
