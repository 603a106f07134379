//! # stillepost-observability
//!
//! Observability-Crate fuer Stillepost:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging via tracing-subscriber
//! - Request-Timing-Middleware
//!
//! Die Router werden in den Haupt-Router des Servers gemerged; einen
//! eigenen Observability-Port gibt es nicht.

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, HealthResponse, HealthStatus};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, system_sammler_starten, StillepostMetrics};
pub use middleware::timing_middleware;
