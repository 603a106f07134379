//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `SP_LOG_LEVEL`: Log-Level (trace/debug/info/warn/error), Standard: info
//! - `SP_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Die Umgebungsvariablen gewinnen gegen die Werte aus der
//! Konfigurationsdatei.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialisiert das Logging-System.
///
/// Liest `SP_LOG_LEVEL` und `SP_LOG_FORMAT` aus der Umgebung und faellt
/// auf die uebergebenen Werte zurueck.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env("SP_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var("SP_LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    match format_env.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
