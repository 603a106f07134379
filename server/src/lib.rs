//! stillepost-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Relay, HTTP-API und Observability zu einem
//! lauffaehigen Prozess. Der Server ist eine duenne Schicht; die
//! eigentliche Logik lebt in den Crates.

pub mod aufraeumen;
pub mod config;
pub mod passwort;
pub mod routen;
pub mod senke;

use anyhow::Result;
use axum::http::HeaderValue;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use stillepost_db::{DatabaseConfig, SqliteDb};
use stillepost_observability::{
    health_router, metrics_router, system_sammler_starten, timing_middleware, StillepostMetrics,
};
use stillepost_relay::{ws_router, RelayState};

use config::ServerConfig;
use routen::ApiZustand;
use senke::DbSenke;

/// Intervall der Metrik-Sammler
const SAMMLER_INTERVALL: Duration = Duration::from_secs(15);

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen
    /// 2. Relay-Zustand mit Datenbank-Senke aufbauen
    /// 3. Metriken und Sammler starten
    /// 4. HTTP/WebSocket-Router zusammensetzen
    /// 5. Aufraeum-Job starten
    /// 6. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        // 1. Datenbank
        let db_config = DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
            sqlite_wal: self.config.datenbank.wal,
        };
        let db = SqliteDb::oeffnen(&db_config).await?;

        // 2. Relay-Zustand mit Datenbank-Senke
        let relay_state = RelayState::neu(Arc::new(DbSenke::neu(db.clone())));

        // 3. Metriken
        let metriken = StillepostMetrics::neu()?;
        system_sammler_starten(metriken.clone(), SAMMLER_INTERVALL);
        relay_sammler_starten(metriken.clone(), Arc::clone(&relay_state));

        // 4. Router
        let api_zustand = Arc::new(ApiZustand {
            db: db.clone(),
            raum_ttl: chrono::Duration::hours(self.config.server.raum_ttl_stunden),
        });
        let app = Router::new()
            .merge(ws_router(Arc::clone(&relay_state)))
            .merge(routen::api_router(api_zustand))
            .merge(health_router())
            .merge(metrics_router(metriken.clone()))
            .layer(axum::middleware::from_fn_with_state(
                metriken.clone(),
                timing_middleware,
            ))
            .layer(cors_layer(&self.config.netzwerk.cors_origins));

        // 5. Aufraeum-Job
        if self.config.aufraeumen.aktiviert {
            aufraeumen::job_starten(
                db.clone(),
                Duration::from_secs(self.config.aufraeumen.intervall_sek),
            );
        }

        // 6. HTTP/WebSocket-Server
        let bind = self.config.http_bind_adresse();
        let listener = tokio::net::TcpListener::bind(&bind).await?;
        tracing::info!(
            adresse = %bind,
            server_name = %self.config.server.name,
            "Stillepost-Server gestartet"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Haelt die Relay-Gauges aktuell (verbundene Clients, aktive Raeume)
fn relay_sammler_starten(
    metriken: StillepostMetrics,
    relay_state: Arc<RelayState>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SAMMLER_INTERVALL);
        loop {
            ticker.tick().await;
            metriken
                .connected_clients
                .set(relay_state.registry.gesamt_clients() as f64);
            metriken
                .rooms_active
                .set(relay_state.registry.raum_anzahl() as f64);
        }
    })
}

/// CORS-Layer aus der Konfiguration
///
/// Leere Origin-Liste bedeutet: alle Origins erlaubt.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let erlaubt: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(wert) => Some(wert),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ungueltiger CORS-Origin wird ignoriert");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(erlaubt)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Wartet auf Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(fehler = %e, "Shutdown-Signal nicht verfuegbar");
        return;
    }
    tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
}
