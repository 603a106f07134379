//! Raum-Verbindung – Verwaltet einen einzelnen Raum-Socket
//!
//! Jede WebSocket-Verbindung bekommt eine `RaumVerbindung` in einem
//! eigenen tokio-Task. Die State Machine ist linear:
//!
//! ```text
//! Offen -> Aktiv -> Geschlossen
//! ```
//!
//! Im Zustand Aktiv werden eingehende Text-Frames dekodiert und an den
//! Raum verteilt. Fehlerhafte Frames erzeugen eine Fehler-Notiz
//! ausschliesslich an den Verursacher; die Verbindung wird deswegen nie
//! getrennt und es gibt keine Wiederholungsversuche.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use stillepost_core::{Fingerprint, RoomId};
use stillepost_protocol::{AbgeleiteteFelder, Envelope};
use tokio::sync::mpsc;

use crate::senke;
use crate::state::RelayState;

// ---------------------------------------------------------------------------
// Verbindungszustand
// ---------------------------------------------------------------------------

/// Zustand der Raum-Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Socket offen, Client noch nicht registriert
    Offen,
    /// Client im Raum registriert, Frames werden verarbeitet
    Aktiv,
    /// Verbindung beendet, keine weiteren Events
    Geschlossen,
}

// ---------------------------------------------------------------------------
// RaumVerbindung
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne WebSocket-Verbindung zu einem Raum
///
/// `raum_id` stammt aus dem Routen-Pfad, `fingerprint` aus den
/// Query-Parametern; beide sind unauthentifizierte Strings. Nach der
/// Registrierung laeuft jede Interaktion mit Peers ueber die Registry –
/// die Verbindung behaelt keine eigenen Client-Handles.
pub struct RaumVerbindung {
    state: Arc<RelayState>,
    raum_id: RoomId,
    fingerprint: Fingerprint,
    zustand: VerbindungsZustand,
}

impl RaumVerbindung {
    /// Erstellt eine neue RaumVerbindung im Zustand Offen
    pub fn neu(state: Arc<RelayState>, raum_id: RoomId, fingerprint: Fingerprint) -> Self {
        Self {
            state,
            raum_id,
            fingerprint,
            zustand: VerbindungsZustand::Offen,
        }
    }

    /// Gibt den aktuellen Verbindungszustand zurueck
    pub fn zustand(&self) -> VerbindungsZustand {
        self.zustand
    }

    /// Registriert den Client im Raum und wechselt nach Aktiv
    pub(crate) fn aktivieren(&mut self) -> mpsc::Receiver<String> {
        let rx = self
            .state
            .registry
            .client_hinzufuegen(&self.raum_id, &self.fingerprint);
        self.zustand = VerbindungsZustand::Aktiv;
        rx
    }

    /// Deregistriert den Client und wechselt nach Geschlossen
    pub(crate) fn schliessen(&mut self) {
        if self.zustand == VerbindungsZustand::Geschlossen {
            return;
        }
        self.state
            .registry
            .client_entfernen(&self.raum_id, &self.fingerprint);
        self.zustand = VerbindungsZustand::Geschlossen;
    }

    /// Verarbeitet einen eingehenden Text-Frame (nur im Zustand Aktiv)
    ///
    /// Dekodiert den Frame mit Raum und Fingerprint der Verbindung als
    /// abgeleiteten Feldern, verteilt ihn an alle anderen Raum-Mitglieder
    /// und reicht ihn danach an die Persistenz-Senke. Bei
    /// Validierungsfehlern erhaelt ausschliesslich der Verursacher eine
    /// Fehler-Notiz.
    pub(crate) fn frame_verarbeiten(&self, roh: &str) {
        if self.zustand != VerbindungsZustand::Aktiv {
            return;
        }

        let abgeleitet = AbgeleiteteFelder {
            raum_id: Some(self.raum_id.clone()),
            sender: Some(self.fingerprint.clone()),
        };

        match Envelope::dekodieren(roh, &abgeleitet) {
            Ok(mut envelope) => {
                // Draht-Angaben zu Raum und Absender werden verworfen;
                // massgeblich ist allein der Verbindungskontext.
                envelope.raum_id = self.raum_id.clone();
                envelope.sender = self.fingerprint.clone();

                match envelope.kodieren() {
                    Ok(draht) => {
                        // Broadcast zuerst; die Senke laeuft losgeloest
                        // und kann die Zustellung nicht verzoegern.
                        let empfaenger = self.state.registry.an_raum_senden(
                            &self.raum_id,
                            &draht,
                            Some(&self.fingerprint),
                        );
                        tracing::debug!(
                            raum = %self.raum_id,
                            absender = %self.fingerprint,
                            empfaenger = empfaenger,
                            "Nachricht verteilt"
                        );
                        senke::im_hintergrund_speichern(Arc::clone(&self.state.senke), envelope);
                    }
                    Err(e) => {
                        tracing::error!(
                            raum = %self.raum_id,
                            fehler = %e,
                            "Envelope konnte nicht kodiert werden"
                        );
                    }
                }
            }
            Err(fehler) => {
                tracing::debug!(
                    raum = %self.raum_id,
                    fingerprint = %self.fingerprint,
                    code = fehler.code.als_str(),
                    "Frame abgelehnt"
                );
                let notiz = Envelope::fehler_notiz(self.raum_id.clone(), Some(fehler), None);
                match notiz.kodieren() {
                    Ok(draht) => {
                        self.state
                            .registry
                            .an_client_senden(&self.raum_id, &self.fingerprint, draht);
                    }
                    Err(e) => {
                        tracing::error!(
                            raum = %self.raum_id,
                            fehler = %e,
                            "Fehler-Notiz konnte nicht kodiert werden"
                        );
                    }
                }
            }
        }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client die Verbindung schliesst oder der Socket
    /// fehlschlaegt. Ausgehende Nachrichten kommen aus der Registry-Queue
    /// dieser Verbindung.
    pub async fn verarbeiten(mut self, socket: WebSocket) {
        let (mut ws_tx, mut ws_rx) = socket.split();
        let mut sende_rx = self.aktivieren();

        loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => self.frame_verarbeiten(&text),
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(
                                raum = %self.raum_id,
                                fingerprint = %self.fingerprint,
                                "Verbindung vom Client getrennt"
                            );
                            break;
                        }
                        Some(Ok(_)) => {
                            // Binary/Ping/Pong sind fuer das Raum-Protokoll
                            // ohne Bedeutung
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                raum = %self.raum_id,
                                fehler = %e,
                                "Socket-Lesefehler"
                            );
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus der Registry
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = ws_tx.send(Message::Text(ausgehend)).await {
                        tracing::warn!(
                            raum = %self.raum_id,
                            fehler = %e,
                            "Senden fehlgeschlagen"
                        );
                        break;
                    }
                }
            }
        }

        self.schliessen();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::senke::{NoopSenke, PersistenzSenke};
    use async_trait::async_trait;
    use std::time::Duration;
    use stillepost_protocol::FehlerCode;
    use tokio::sync::mpsc::Receiver;
    use tokio::time::timeout;

    /// Senke die jeden gespeicherten Envelope an einen Test-Kanal meldet
    struct MeldeSenke {
        tx: mpsc::Sender<Envelope>,
    }

    #[async_trait]
    impl PersistenzSenke for MeldeSenke {
        async fn nachricht_speichern(&self, envelope: &Envelope) -> anyhow::Result<()> {
            let _ = self.tx.send(envelope.clone()).await;
            Ok(())
        }

        async fn raum_aktivitaet(&self, _raum_id: &RoomId) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn leeren(rx: &mut Receiver<String>) {
        while rx.try_recv().is_ok() {}
    }

    fn client_frame(content: &str) -> String {
        format!(r#"{{"id":"a1b2c3d4e5","type":"client","ts":1712345678901,"content":"{content}"}}"#)
    }

    #[tokio::test]
    async fn zustandsmaschine_ist_linear() {
        let state = RelayState::neu(Arc::new(NoopSenke));
        let mut verbindung = RaumVerbindung::neu(
            Arc::clone(&state),
            RoomId::neu("r1"),
            Fingerprint::neu("a"),
        );
        assert_eq!(verbindung.zustand(), VerbindungsZustand::Offen);

        let _rx = verbindung.aktivieren();
        assert_eq!(verbindung.zustand(), VerbindungsZustand::Aktiv);
        assert!(state.registry.ist_verbunden(&RoomId::neu("r1"), &Fingerprint::neu("a")));

        verbindung.schliessen();
        assert_eq!(verbindung.zustand(), VerbindungsZustand::Geschlossen);
        assert!(!state.registry.raum_existiert(&RoomId::neu("r1")));

        // Erneutes Schliessen ist ein No-Op
        verbindung.schliessen();
    }

    #[tokio::test]
    async fn frames_vor_aktivierung_werden_ignoriert() {
        let state = RelayState::neu(Arc::new(NoopSenke));
        let verbindung = RaumVerbindung::neu(
            Arc::clone(&state),
            RoomId::neu("r1"),
            Fingerprint::neu("a"),
        );

        verbindung.frame_verarbeiten(&client_frame("zu frueh"));
        assert!(!state.registry.raum_existiert(&RoomId::neu("r1")));
    }

    #[tokio::test]
    async fn gueltiger_frame_erreicht_peers_aber_nicht_den_absender() {
        let state = RelayState::neu(Arc::new(NoopSenke));
        let raum = RoomId::neu("r1");

        let mut verbindung =
            RaumVerbindung::neu(Arc::clone(&state), raum.clone(), Fingerprint::neu("a"));
        let mut rx_a = verbindung.aktivieren();
        let mut rx_b = state.registry.client_hinzufuegen(&raum, &Fingerprint::neu("b"));
        leeren(&mut rx_a);
        leeren(&mut rx_b);

        verbindung.frame_verarbeiten(&client_frame("geheim"));

        let bei_b = rx_b.try_recv().expect("b muss den Envelope erhalten");
        let envelope = Envelope::dekodieren(&bei_b, &AbgeleiteteFelder::default()).unwrap();
        assert!(envelope.ist_client());
        assert_eq!(envelope.sender, Fingerprint::neu("a"));
        assert_eq!(envelope.content, "geheim");

        assert!(rx_a.try_recv().is_err(), "Absender erhaelt keine Kopie");
    }

    #[tokio::test]
    async fn draht_raum_und_sender_werden_ueberschrieben() {
        let state = RelayState::neu(Arc::new(NoopSenke));
        let raum = RoomId::neu("echter-raum");

        let mut verbindung =
            RaumVerbindung::neu(Arc::clone(&state), raum.clone(), Fingerprint::neu("a"));
        let mut rx_a = verbindung.aktivieren();
        let mut rx_b = state.registry.client_hinzufuegen(&raum, &Fingerprint::neu("b"));
        leeren(&mut rx_a);
        leeren(&mut rx_b);

        // Frame behauptet einen fremden Raum und Absender
        let frame = r#"{"id":"a1b2c3d4e5","type":"client","roomId":"fremder-raum","sender":"nicht-a","ts":1,"content":"x"}"#;
        verbindung.frame_verarbeiten(frame);

        let bei_b = rx_b.try_recv().expect("Zustellung im echten Raum");
        let envelope = Envelope::dekodieren(&bei_b, &AbgeleiteteFelder::default()).unwrap();
        assert_eq!(envelope.raum_id, raum);
        assert_eq!(envelope.sender, Fingerprint::neu("a"));
    }

    #[tokio::test]
    async fn fehler_isolation_nur_der_verursacher_erhaelt_die_notiz() {
        let state = RelayState::neu(Arc::new(NoopSenke));
        let raum = RoomId::neu("r1");

        let mut verbindung =
            RaumVerbindung::neu(Arc::clone(&state), raum.clone(), Fingerprint::neu("a"));
        let mut rx_a = verbindung.aktivieren();
        let mut rx_b = state.registry.client_hinzufuegen(&raum, &Fingerprint::neu("b"));
        leeren(&mut rx_a);
        leeren(&mut rx_b);

        verbindung.frame_verarbeiten("das ist kein json");

        let bei_a = rx_a.try_recv().expect("a erhaelt die Fehler-Notiz");
        // Fehler-Notizen sind eine reine Ausgangsrichtung und laufen
        // nicht durch dekodieren
        let notiz: Envelope = serde_json::from_str(&bei_a).unwrap();
        assert!(notiz.ist_fehler_notiz());
        assert_eq!(
            notiz.metadata.get("code").and_then(|w| w.as_str()),
            Some(FehlerCode::MalformedMessage.als_str())
        );

        assert!(rx_b.try_recv().is_err(), "b darf nichts erhalten");
    }

    #[tokio::test]
    async fn akzeptierte_envelopes_erreichen_die_senke() {
        let (melde_tx, mut melde_rx) = mpsc::channel(8);
        let state = RelayState::neu(Arc::new(MeldeSenke { tx: melde_tx }));
        let raum = RoomId::neu("r1");

        let mut verbindung =
            RaumVerbindung::neu(Arc::clone(&state), raum.clone(), Fingerprint::neu("a"));
        let _rx = verbindung.aktivieren();

        verbindung.frame_verarbeiten(&client_frame("fuer die ablage"));

        let gespeichert = timeout(Duration::from_secs(1), melde_rx.recv())
            .await
            .expect("Senke muss den Envelope erhalten")
            .unwrap();
        assert_eq!(gespeichert.content, "fuer die ablage");
        assert_eq!(gespeichert.raum_id, raum);
    }

    #[tokio::test]
    async fn abgelehnte_frames_erreichen_die_senke_nicht() {
        let (melde_tx, mut melde_rx) = mpsc::channel(8);
        let state = RelayState::neu(Arc::new(MeldeSenke { tx: melde_tx }));

        let mut verbindung = RaumVerbindung::neu(
            Arc::clone(&state),
            RoomId::neu("r1"),
            Fingerprint::neu("a"),
        );
        let _rx = verbindung.aktivieren();

        verbindung.frame_verarbeiten("kaputt");
        tokio::task::yield_now().await;
        assert!(melde_rx.try_recv().is_err());
    }
}
