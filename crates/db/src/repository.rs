//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt HTTP-Schicht und Aufraeum-Job von
//! der konkreten SQLite-Implementierung.

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::{AufraeumErgebnis, NachrichtRecord, NeueNachricht, NeuerRaum, RaumRecord};

/// Result-Typ fuer alle Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://stillepost.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://stillepost.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Raum-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait RaumRepository: Send + Sync {
    /// Legt einen neuen Raum an
    async fn erstellen(&self, data: NeuerRaum<'_>) -> DbResult<RaumRecord>;

    /// Laedt einen Raum anhand seiner ID
    async fn laden(&self, id: &str) -> DbResult<Option<RaumRecord>>;

    /// Traegt den Gast-Schluessel ein (genau ein Gast pro Raum)
    async fn gast_setzen(
        &self,
        id: &str,
        public_key: &str,
        fingerprint: &str,
    ) -> DbResult<RaumRecord>;

    /// Aktualisiert den Aktivitaets-Zeitstempel eines Raums
    async fn aktivitaet_beruehren(&self, id: &str) -> DbResult<()>;

    /// Loescht alle Raeume deren Ablaufzeit vor `stichtag` liegt,
    /// samt zugehoeriger Nachrichten
    async fn abgelaufene_loeschen(&self, stichtag: DateTime<Utc>) -> DbResult<AufraeumErgebnis>;
}

/// Repository fuer Nachrichten-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait NachrichtenRepository: Send + Sync {
    /// Speichert eine Nachricht
    async fn erstellen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord>;

    /// Laedt alle Nachrichten eines Raums in chronologischer Reihenfolge
    async fn fuer_raum(&self, room_id: &str) -> DbResult<Vec<NachrichtRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert_eq!(cfg.url, "sqlite://stillepost.db");
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
    }
}
