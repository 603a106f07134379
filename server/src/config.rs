//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};
use stillepost_core::StillepostError;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Einstellungen des Aufraeum-Jobs
    pub aufraeumen: AufraeumEinstellungen,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei
    ///
    /// Fehlt die Datei, werden die Standardwerte verwendet.
    pub fn laden(pfad: &str) -> Result<Self, StillepostError> {
        let inhalt = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => inhalt,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(StillepostError::konfiguration(format!(
                    "Konfigurationsdatei {pfad} nicht lesbar: {e}"
                )));
            }
        };

        toml::from_str(&inhalt).map_err(|e| {
            StillepostError::konfiguration(format!("Konfigurationsdatei {pfad} ungueltig: {e}"))
        })
    }

    /// Gibt die Bind-Adresse des HTTP/WebSocket-Servers zurueck
    pub fn http_bind_adresse(&self) -> String {
        format!(
            "{}:{}",
            self.netzwerk.bind_adresse, self.netzwerk.http_port
        )
    }
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Lebensdauer eines Raums in Stunden (ab Anlage)
    pub raum_ttl_stunden: i64,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Stillepost Relay".into(),
            raum_ttl_stunden: 24,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    /// Port fuer HTTP und WebSocket
    pub http_port: u16,
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            http_port: 3000,
            cors_origins: vec![],
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Modus aktivieren
    pub wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://stillepost.db".into(),
            max_verbindungen: 5,
            wal: true,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Einstellungen des Aufraeum-Jobs fuer abgelaufene Raeume
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AufraeumEinstellungen {
    /// Job aktivieren
    pub aktiviert: bool,
    /// Intervall zwischen zwei Laeufen in Sekunden
    pub intervall_sek: u64,
}

impl Default for AufraeumEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            intervall_sek: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardwerte_sind_lauffaehig() {
        let config = ServerConfig::default();
        assert_eq!(config.netzwerk.http_port, 3000);
        assert_eq!(config.server.raum_ttl_stunden, 24);
        assert!(config.aufraeumen.aktiviert);
        assert_eq!(config.http_bind_adresse(), "0.0.0.0:3000");
    }

    #[test]
    fn fehlende_datei_ergibt_standardwerte() {
        let config = ServerConfig::laden("/gibt/es/nicht/config.toml").unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn teil_konfiguration_wird_aufgefuellt() {
        let config: ServerConfig = toml::from_str(
            r#"
            [netzwerk]
            http_port = 8080

            [server]
            raum_ttl_stunden = 48
            "#,
        )
        .unwrap();
        assert_eq!(config.netzwerk.http_port, 8080);
        assert_eq!(config.server.raum_ttl_stunden, 48);
        // Nicht gesetzte Sektionen behalten ihre Standardwerte
        assert_eq!(config.datenbank.url, "sqlite://stillepost.db");
    }

    #[test]
    fn kaputtes_toml_wird_abgelehnt() {
        let pfad = std::env::temp_dir().join("stillepost_config_kaputt.toml");
        std::fs::write(&pfad, "das ist [kein toml").unwrap();
        let fehler = ServerConfig::laden(pfad.to_str().unwrap()).unwrap_err();
        assert!(matches!(fehler, StillepostError::Konfiguration(_)));
        let _ = std::fs::remove_file(&pfad);
    }
}
