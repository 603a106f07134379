//! Geteilter Relay-Zustand
//!
//! Haelt Registry und Persistenz-Senke als Arc-Referenzen, die sicher
//! zwischen allen Verbindungs-Tasks geteilt werden. Der Zustand wird
//! einmal pro Prozess erzeugt und per Handle durchgereicht – kein
//! globaler Singleton, damit Tests frische Instanzen verwenden koennen.

use std::sync::Arc;
use std::time::Instant;

use crate::registry::RaumRegistry;
use crate::senke::PersistenzSenke;

/// Gemeinsamer Zustand des Relays (thread-safe, Arc-geteilt)
pub struct RelayState {
    /// Raum-Registry (Anwesenheit und Broadcast)
    pub registry: RaumRegistry,
    /// Persistenz-Senke fuer akzeptierte Nachrichten
    pub senke: Arc<dyn PersistenzSenke>,
    /// Startzeitpunkt des Relays (fuer Uptime-Berechnung)
    pub start_zeit: Instant,
}

impl RelayState {
    /// Erstellt einen neuen RelayState mit leerer Registry
    pub fn neu(senke: Arc<dyn PersistenzSenke>) -> Arc<Self> {
        Arc::new(Self {
            registry: RaumRegistry::neu(),
            senke,
            start_zeit: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_zeit.elapsed().as_secs()
    }
}
