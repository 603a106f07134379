//! Raum-Registry – Wer ist in welchem Raum verbunden
//!
//! Die Registry verwaltet die Send-Queues aller verbundenen Clients,
//! gruppiert nach Raum, und stellt Broadcast-Methoden bereit.
//! Raum-Eintraege entstehen implizit mit dem ersten Client und
//! verschwinden mit dem letzten – die Registry verfolgt Anwesenheit,
//! nicht Raum-Existenz (die gehoert der Persistenzschicht).
//!
//! ## Broadcast-Schnappschuss
//! Vor jeder Zustellung wird die Mitgliedschaft als Schnappschuss
//! kopiert, damit parallele Joins/Leaves die Iteration nicht stoeren
//! und kein gerade entferntes Handle mehr beliefert wird.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

use stillepost_core::{Fingerprint, RoomId};
use stillepost_protocol::Envelope;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SENDE_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
///
/// Die `RaumVerbindung` liest aus der Gegenseite dieser Queue und
/// schreibt auf den Socket. Die Registry besitzt alle Handles exklusiv;
/// Verbindungen behalten nach der Registrierung keine eigene Kopie.
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub fingerprint: Fingerprint,
    pub tx: mpsc::Sender<String>,
}

impl ClientSender {
    /// Reiht einen Draht-String nicht-blockierend beim Client ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: String) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    fingerprint = %self.fingerprint,
                    "Send-Queue voll – Nachricht verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    fingerprint = %self.fingerprint,
                    "Send-Queue geschlossen (Client getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RaumRegistry
// ---------------------------------------------------------------------------

/// Clients eines Raums, indiziert nach Fingerprint
pub type RaumClients = Arc<DashMap<Fingerprint, ClientSender>>;

/// Registry aller Raeume mit verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
/// Pro Prozess wird genau eine Registry erzeugt und an alle
/// Verbindungen durchgereicht; Tests erzeugen je eine frische Instanz.
#[derive(Clone)]
pub struct RaumRegistry {
    inner: Arc<RaumRegistryInner>,
}

struct RaumRegistryInner {
    /// Raum-ID -> Client-Map
    raeume: DashMap<RoomId, RaumClients>,
}

impl RaumRegistry {
    /// Erstellt eine neue leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RaumRegistryInner {
                raeume: DashMap::new(),
            }),
        }
    }

    /// Gibt die Client-Map eines Raums zurueck, legt sie bei Bedarf leer an
    ///
    /// Zwei aufeinanderfolgende Aufrufe fuer denselben Raum liefern
    /// dieselbe Map-Instanz. Nebenlaeufig zu Joins/Leaves aufrufbar ohne
    /// Eintraege zu verlieren oder doppelte Maps zu erzeugen.
    pub fn raum_clients(&self, raum_id: &RoomId) -> RaumClients {
        self.inner
            .raeume
            .entry(raum_id.clone())
            .or_default()
            .clone()
    }

    /// Registriert einen Client im Raum und gibt seine Empfangs-Queue zurueck
    ///
    /// Ein Reconnect unter demselben Fingerprint ersetzt das alte Handle
    /// stillschweigend (letzter Schreiber gewinnt). Alle Raum-Mitglieder
    /// einschliesslich des neuen erhalten eine Join-Notiz.
    pub fn client_hinzufuegen(
        &self,
        raum_id: &RoomId,
        fingerprint: &Fingerprint,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
        let sender = ClientSender {
            fingerprint: fingerprint.clone(),
            tx,
        };

        {
            // Entry-Guard haelt den Shard gesperrt, damit ein paralleles
            // client_entfernen den Raum nicht zwischen Anlegen und
            // Einfuegen loeschen kann.
            let clients = self.inner.raeume.entry(raum_id.clone()).or_default();
            clients.insert(fingerprint.clone(), sender);
        }

        tracing::info!(
            raum = %raum_id,
            fingerprint = %fingerprint,
            "Client mit Raum verbunden"
        );

        let notiz = Envelope::server_notiz(
            raum_id.clone(),
            format!("{fingerprint} hat den Raum betreten"),
            Some(aktivitaets_metadata(fingerprint, "join")),
        );
        self.notiz_senden(raum_id, &notiz);

        rx
    }

    /// Entfernt einen Client aus seinem Raum
    ///
    /// Wird die Client-Map dadurch leer, verschwindet der Raum-Eintrag
    /// vollstaendig aus der Registry; ein spaeteres `client_hinzufuegen`
    /// legt ihn frisch an, ohne Erinnerung an fruehere Mitglieder.
    /// Verbleibende Mitglieder erhalten eine Leave-Notiz.
    pub fn client_entfernen(&self, raum_id: &RoomId, fingerprint: &Fingerprint) {
        let entfernt = match self.inner.raeume.get(raum_id) {
            Some(clients) => clients.remove(fingerprint).is_some(),
            None => return,
        };
        if !entfernt {
            return;
        }

        tracing::info!(
            raum = %raum_id,
            fingerprint = %fingerprint,
            "Client vom Raum getrennt"
        );

        let raum_geloescht = self
            .inner
            .raeume
            .remove_if(raum_id, |_, clients| clients.is_empty())
            .is_some();
        if raum_geloescht {
            tracing::info!(raum = %raum_id, "Raum ist leer und wird entfernt");
            return;
        }

        let notiz = Envelope::server_notiz(
            raum_id.clone(),
            format!("{fingerprint} hat den Raum verlassen"),
            Some(aktivitaets_metadata(fingerprint, "leave")),
        );
        self.notiz_senden(raum_id, &notiz);
    }

    /// Sendet einen Draht-String an alle Clients eines Raums
    ///
    /// Iteriert einen Schnappschuss der aktuellen Mitgliedschaft;
    /// `ausser` wird uebersprungen falls angegeben. Fehlschlaege
    /// einzelner Empfaenger brechen die Zustellung an die uebrigen
    /// nicht ab. Gibt die Anzahl erfolgreich eingereihter Nachrichten
    /// zurueck.
    pub fn an_raum_senden(
        &self,
        raum_id: &RoomId,
        nachricht: &str,
        ausser: Option<&Fingerprint>,
    ) -> usize {
        let schnappschuss: Vec<ClientSender> = match self.inner.raeume.get(raum_id) {
            Some(clients) => clients
                .iter()
                .filter(|eintrag| ausser != Some(eintrag.key()))
                .map(|eintrag| eintrag.value().clone())
                .collect(),
            None => return 0,
        };

        let mut gesendet = 0;
        for sender in &schnappschuss {
            if sender.senden(nachricht.to_string()) {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Sendet einen Draht-String an genau einen Client eines Raums
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und die Nachricht
    /// eingereiht wurde.
    pub fn an_client_senden(
        &self,
        raum_id: &RoomId,
        fingerprint: &Fingerprint,
        nachricht: String,
    ) -> bool {
        let sender = self
            .inner
            .raeume
            .get(raum_id)
            .and_then(|clients| clients.get(fingerprint).map(|e| e.value().clone()));

        match sender {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(
                    raum = %raum_id,
                    fingerprint = %fingerprint,
                    "Senden an unbekannten Client"
                );
                false
            }
        }
    }

    /// Prueft ob ein Raum verbundene Clients hat
    pub fn raum_existiert(&self, raum_id: &RoomId) -> bool {
        self.inner.raeume.contains_key(raum_id)
    }

    /// Prueft ob ein Client in einem Raum registriert ist
    pub fn ist_verbunden(&self, raum_id: &RoomId, fingerprint: &Fingerprint) -> bool {
        self.inner
            .raeume
            .get(raum_id)
            .map(|clients| clients.contains_key(fingerprint))
            .unwrap_or(false)
    }

    /// Gibt die Anzahl der Clients in einem Raum zurueck
    pub fn client_anzahl(&self, raum_id: &RoomId) -> usize {
        self.inner
            .raeume
            .get(raum_id)
            .map(|clients| clients.len())
            .unwrap_or(0)
    }

    /// Gibt die Anzahl der Raeume mit mindestens einem Client zurueck
    pub fn raum_anzahl(&self) -> usize {
        self.inner.raeume.len()
    }

    /// Gibt die Gesamtzahl verbundener Clients ueber alle Raeume zurueck
    pub fn gesamt_clients(&self) -> usize {
        self.inner
            .raeume
            .iter()
            .map(|eintrag| eintrag.value().len())
            .sum()
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    /// Kodiert eine Notiz und sendet sie an alle Raum-Mitglieder
    fn notiz_senden(&self, raum_id: &RoomId, notiz: &Envelope) {
        match notiz.kodieren() {
            Ok(draht) => {
                self.an_raum_senden(raum_id, &draht, None);
            }
            Err(e) => {
                tracing::error!(raum = %raum_id, fehler = %e, "Notiz konnte nicht kodiert werden");
            }
        }
    }
}

impl Default for RaumRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

/// Metadata einer Join/Leave-Notiz
fn aktivitaets_metadata(fingerprint: &Fingerprint, aktion: &str) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("action".into(), Value::String(aktion.into()));
    meta.insert(
        "fingerprint".into(),
        Value::String(fingerprint.als_str().into()),
    );
    meta
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
