//! Persistenz-Senke – Schnittstelle zur Nachrichten-Ablage
//!
//! Die Senke ist ein externer Kollaborateur: akzeptierte Envelopes werden
//! nach dem Broadcast in einem losgeloesten Task abgelegt. Fehlschlaege
//! werden ausschliesslich geloggt und erreichen weder Absender noch
//! Empfaenger – die Zustellung an Peers haengt nie an der Speicherung.

use async_trait::async_trait;
use std::sync::Arc;

use stillepost_core::RoomId;
use stillepost_protocol::Envelope;

/// Schnittstelle der Persistenz-Senke (best effort)
#[async_trait]
pub trait PersistenzSenke: Send + Sync {
    /// Speichert einen akzeptierten Envelope
    async fn nachricht_speichern(&self, envelope: &Envelope) -> anyhow::Result<()>;

    /// Aktualisiert den Aktivitaets-Zeitstempel eines Raums
    async fn raum_aktivitaet(&self, raum_id: &RoomId) -> anyhow::Result<()>;
}

/// Senke die nichts tut – fuer Tests und den Betrieb ohne Datenbank
pub struct NoopSenke;

#[async_trait]
impl PersistenzSenke for NoopSenke {
    async fn nachricht_speichern(&self, _envelope: &Envelope) -> anyhow::Result<()> {
        Ok(())
    }

    async fn raum_aktivitaet(&self, _raum_id: &RoomId) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Reicht einen Envelope als losgeloesten Hintergrund-Task an die Senke
///
/// Der Aufrufer wartet nie auf das Ergebnis. Beide Schritte werden
/// unabhaengig voneinander versucht; ein Fehlschlag beim Speichern
/// verhindert die Aktivitaets-Aktualisierung nicht.
pub fn im_hintergrund_speichern(senke: Arc<dyn PersistenzSenke>, envelope: Envelope) {
    tokio::spawn(async move {
        match senke.nachricht_speichern(&envelope).await {
            Ok(()) => {
                tracing::debug!(nachricht_id = %envelope.id, "Nachricht gespeichert");
            }
            Err(e) => {
                tracing::error!(
                    nachricht_id = %envelope.id,
                    fehler = %e,
                    "Nachricht konnte nicht gespeichert werden"
                );
            }
        }

        match senke.raum_aktivitaet(&envelope.raum_id).await {
            Ok(()) => {
                tracing::debug!(raum = %envelope.raum_id, "Raum-Aktivitaet aktualisiert");
            }
            Err(e) => {
                tracing::error!(
                    raum = %envelope.raum_id,
                    fehler = %e,
                    "Raum-Aktivitaet konnte nicht aktualisiert werden"
                );
            }
        }
    });
}
