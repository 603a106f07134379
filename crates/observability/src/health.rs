//! Health-Check-Endpunkt fuer Stillepost
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und DB-Verbindungsstatus

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub db_connected: bool,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
    pub db_connected: Arc<AtomicBool>,
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            db_connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn db_verbunden(&self) -> bool {
        self.db_connected.load(Ordering::Relaxed)
    }

    pub fn db_status_setzen(&self, verbunden: bool) {
        self.db_connected.store(verbunden, Ordering::Relaxed);
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router() -> Router {
    let state = HealthState::neu();
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let db_connected = state.db_verbunden();
    let status = if db_connected {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let http_status = match status {
        // 200 auch bei degraded, damit Probes nicht failen
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        db_connected,
    };

    (http_status, Json(response))
}
