//! Prometheus-kompatible Metriken fuer Stillepost
//!
//! Registrierte Metriken:
//! - `stillepost_connected_clients` – Gauge: Aktuell verbundene Clients
//! - `stillepost_rooms_active` – Gauge: Raeume mit mindestens einem Client
//! - `stillepost_cpu_usage_percent` – Gauge: CPU-Auslastung
//! - `stillepost_memory_usage_bytes` – Gauge: Speicherverbrauch
//! - `stillepost_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `stillepost_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;

/// Alle Stillepost-Prometheus-Metriken
#[derive(Clone)]
pub struct StillepostMetrics {
    pub registry: Arc<Registry>,

    // Relay-Metriken
    pub connected_clients: Gauge,
    pub rooms_active: Gauge,

    // System-Metriken
    pub cpu_usage_percent: Gauge,
    pub memory_usage_bytes: Gauge,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl StillepostMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Relay-Metriken ---
        let connected_clients = Gauge::with_opts(Opts::new(
            "stillepost_connected_clients",
            "Anzahl aktuell verbundener Clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let rooms_active = Gauge::with_opts(Opts::new(
            "stillepost_rooms_active",
            "Anzahl Raeume mit mindestens einem verbundenen Client",
        ))?;
        registry.register(Box::new(rooms_active.clone()))?;

        // --- System-Metriken ---
        let cpu_usage_percent = Gauge::with_opts(Opts::new(
            "stillepost_cpu_usage_percent",
            "CPU-Auslastung in Prozent (0-100)",
        ))?;
        registry.register(Box::new(cpu_usage_percent.clone()))?;

        let memory_usage_bytes = Gauge::with_opts(Opts::new(
            "stillepost_memory_usage_bytes",
            "Speicherverbrauch in Bytes",
        ))?;
        registry.register(Box::new(memory_usage_bytes.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "stillepost_http_requests_total",
                "Gesamtanzahl HTTP-Anfragen",
            ),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "stillepost_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            rooms_active,
            cpu_usage_percent,
            memory_usage_bytes,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: StillepostMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(
    axum::extract::State(metriken): axum::extract::State<StillepostMetrics>,
) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Startet den Sammler fuer CPU- und Speicher-Metriken
///
/// Aktualisiert die System-Gauges im gegebenen Intervall in einem
/// eigenen Task.
pub fn system_sammler_starten(
    metriken: StillepostMetrics,
    intervall: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sys = System::new_all();
        let mut ticker = tokio::time::interval(intervall);
        loop {
            ticker.tick().await;
            sys.refresh_cpu_usage();
            sys.refresh_memory();
            metriken
                .cpu_usage_percent
                .set(f64::from(sys.global_cpu_usage()));
            metriken.memory_usage_bytes.set(sys.used_memory() as f64);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = StillepostMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauge_connected_clients_setzen() {
        let metriken = StillepostMetrics::neu().unwrap();
        metriken.connected_clients.set(42.0);
        assert_eq!(metriken.connected_clients.get(), 42.0);
    }

    #[test]
    fn http_counter_mit_labels() {
        let metriken = StillepostMetrics::neu().unwrap();
        metriken
            .http_requests_total
            .with_label_values(&["GET", "/health", "200"])
            .inc();
        assert_eq!(
            metriken
                .http_requests_total
                .with_label_values(&["GET", "/health", "200"])
                .get(),
            1
        );
    }

    #[test]
    fn export_enthaelt_metrik_namen() {
        let metriken = StillepostMetrics::neu().unwrap();
        metriken.rooms_active.set(3.0);
        let text = metriken.exportieren().unwrap();
        assert!(text.contains("stillepost_rooms_active"));
        assert!(text.contains("stillepost_connected_clients"));
    }
}
