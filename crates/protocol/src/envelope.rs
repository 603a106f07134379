//! Envelope – die Einheit der Socket-Kommunikation
//!
//! Auf dem Draht ist ein Envelope ein JSON-Objekt mit `ts` als
//! Unix-Millisekunden. Eingehende Client-Frames duerfen `roomId` und
//! `sender` weglassen; beide werden dann aus dem Verbindungskontext
//! abgeleitet. Ein Envelope der die Dekodierung verlaesst hat immer
//! einen nicht-leeren Raum und Absender.
//!
//! ## Draht-Format
//!
//! ```text
//! { "id": "a1b2c3d4e5", "type": "client", "roomId": "...", "sender": "...",
//!   "ts": 1712345678901, "content": "<ciphertext>", "metadata": { ... } }
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use stillepost_core::{ids, Fingerprint, MessageId, RoomId};

use crate::error::NachrichtenFehler;

/// Absender-Kennung aller vom Relay erzeugten Envelopes
pub const RELAY_ABSENDER: &str = "server";

// ---------------------------------------------------------------------------
// EnvelopeArt
// ---------------------------------------------------------------------------

/// Art eines Envelopes
///
/// `Client` stammt von einem Teilnehmer, `Server` ist eine vom Relay
/// erzeugte Notiz (Join/Leave), `Error` meldet einen Validierungsfehler
/// ausschliesslich an den Verursacher. Eingehend sind nur `client` und
/// `server` zulaessig; `error` ist eine reine Ausgangsrichtung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeArt {
    Client,
    Server,
    Error,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Eine Nachricht auf dem Raum-Socket
///
/// `content` ist aus Relay-Sicht ein opaker String (Ciphertext);
/// `metadata` ist eine offene Map fuer Fehler-Codes und Erweiterungen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: MessageId,
    #[serde(rename = "type")]
    pub art: EnvelopeArt,
    #[serde(rename = "roomId")]
    pub raum_id: RoomId,
    pub sender: Fingerprint,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Vom Verbindungskontext abgeleitete Felder fuer die Dekodierung
///
/// Die Verbindung ist bereits auf genau einen Raum und einen Fingerprint
/// festgelegt; eingehende Frames muessen beides deshalb nicht mitschicken.
#[derive(Debug, Clone, Default)]
pub struct AbgeleiteteFelder {
    pub raum_id: Option<RoomId>,
    pub sender: Option<Fingerprint>,
}

impl Envelope {
    /// Dekodiert und validiert einen Draht-String
    ///
    /// Reihenfolge: (1) JSON-Parse, bei Fehlschlag `MALFORMED_MESSAGE`;
    /// (2) Feld-Validierung in Draht-Reihenfolge, das erste fehlerhafte
    /// Feld wird in der Meldung benannt (`INVALID_MESSAGE_SCHEMA`);
    /// (3) `roomId`/`sender` aus dem Frame, sonst aus `abgeleitet` –
    /// bleibt eines unaufloesbar, wird der Frame abgelehnt statt ein
    /// unvollstaendiger Envelope konstruiert.
    pub fn dekodieren(
        roh: &str,
        abgeleitet: &AbgeleiteteFelder,
    ) -> Result<Self, NachrichtenFehler> {
        let wert: Value = serde_json::from_str(roh)
            .map_err(|_| NachrichtenFehler::malformed("Frame ist kein gueltiges JSON"))?;
        let objekt = wert
            .as_object()
            .ok_or_else(|| NachrichtenFehler::schema("$", "JSON-Objekt erwartet"))?;

        let id = pflicht_string(objekt, "id")?;
        if id.chars().count() != ids::ID_LAENGE {
            return Err(NachrichtenFehler::schema(
                "id",
                format!("genau {} Zeichen erwartet", ids::ID_LAENGE),
            ));
        }

        let art = match pflicht_string(objekt, "type")?.as_str() {
            "client" => EnvelopeArt::Client,
            "server" => EnvelopeArt::Server,
            sonst => {
                return Err(NachrichtenFehler::schema(
                    "type",
                    format!("'client' oder 'server' erwartet, nicht '{sonst}'"),
                ));
            }
        };

        let raum_im_frame = optional_string(objekt, "roomId")?;
        let sender_im_frame = optional_string(objekt, "sender")?;

        let ts_ms = match objekt.get("ts") {
            None => return Err(NachrichtenFehler::schema("ts", "Feld fehlt")),
            Some(wert) => wert
                .as_i64()
                .or_else(|| wert.as_f64().map(|f| f as i64))
                .ok_or_else(|| NachrichtenFehler::schema("ts", "Zahl erwartet"))?,
        };

        let content = pflicht_string(objekt, "content")?;

        let metadata = match objekt.get("metadata") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(NachrichtenFehler::schema("metadata", "Objekt erwartet")),
        };

        let raum_id = raum_im_frame
            .map(RoomId::neu)
            .or_else(|| abgeleitet.raum_id.clone())
            .ok_or_else(|| {
                NachrichtenFehler::schema(
                    "roomId",
                    "fehlt und ist nicht vom Verbindungskontext ableitbar",
                )
            })?;

        let sender = sender_im_frame
            .map(Fingerprint::neu)
            .or_else(|| abgeleitet.sender.clone())
            .ok_or_else(|| {
                NachrichtenFehler::schema(
                    "sender",
                    "fehlt und ist nicht vom Verbindungskontext ableitbar",
                )
            })?;

        let ts = Utc
            .timestamp_millis_opt(ts_ms)
            .single()
            .ok_or_else(|| {
                NachrichtenFehler::schema("ts", "Zeitstempel ausserhalb des gueltigen Bereichs")
            })?;

        Ok(Self {
            id: MessageId::neu(id),
            art,
            raum_id,
            sender,
            ts,
            content,
            metadata,
        })
    }

    /// Serialisiert den Envelope als Draht-String
    ///
    /// Die Feldreihenfolge ist durch die Strukturdefinition stabil,
    /// `ts` wird als Unix-Millisekunden ausgegeben.
    pub fn kodieren(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Erstellt eine Server-Notiz (Join/Leave) mit frischer ID
    pub fn server_notiz(
        raum_id: RoomId,
        content: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            id: MessageId::generieren(),
            art: EnvelopeArt::Server,
            raum_id,
            sender: Fingerprint::neu(RELAY_ABSENDER),
            ts: Utc::now(),
            content: content.into(),
            metadata: metadata.unwrap_or_default(),
        }
    }

    /// Erstellt eine Fehler-Notiz fuer den Verursacher eines Frames
    ///
    /// Ohne konkreten Fehler wird `UNKNOWN_ERROR` verwendet. Code und
    /// Kontext landen in `metadata`; bei Schluessel-Kollision gewinnen
    /// die vom Aufrufer mitgegebenen Eintraege.
    pub fn fehler_notiz(
        raum_id: RoomId,
        fehler: Option<NachrichtenFehler>,
        metadata: Option<Map<String, Value>>,
    ) -> Self {
        let fehler = fehler.unwrap_or_else(NachrichtenFehler::unbekannt);

        let mut meta = Map::new();
        meta.insert("code".into(), Value::String(fehler.code.als_str().into()));
        meta.insert(
            "context".into(),
            match fehler.context {
                Some(context) => Value::Object(context),
                None => Value::Null,
            },
        );
        if let Some(extra) = metadata {
            for (schluessel, wert) in extra {
                meta.insert(schluessel, wert);
            }
        }

        Self {
            id: MessageId::generieren(),
            art: EnvelopeArt::Error,
            raum_id,
            sender: Fingerprint::neu(RELAY_ABSENDER),
            ts: Utc::now(),
            content: fehler.nachricht,
            metadata: meta,
        }
    }

    /// Prueft ob der Envelope von einem Teilnehmer stammt
    pub fn ist_client(&self) -> bool {
        self.art == EnvelopeArt::Client
    }

    /// Prueft ob der Envelope eine Server-Notiz ist
    pub fn ist_server_notiz(&self) -> bool {
        self.art == EnvelopeArt::Server
    }

    /// Prueft ob der Envelope eine Fehler-Notiz ist
    pub fn ist_fehler_notiz(&self) -> bool {
        self.art == EnvelopeArt::Error
    }
}

// ---------------------------------------------------------------------------
// Interne Validierungshelfer
// ---------------------------------------------------------------------------

fn pflicht_string(
    objekt: &Map<String, Value>,
    feld: &str,
) -> Result<String, NachrichtenFehler> {
    match objekt.get(feld) {
        None => Err(NachrichtenFehler::schema(feld, "Feld fehlt")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(NachrichtenFehler::schema(feld, "String erwartet")),
    }
}

fn optional_string(
    objekt: &Map<String, Value>,
    feld: &str,
) -> Result<Option<String>, NachrichtenFehler> {
    match objekt.get(feld) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(NachrichtenFehler::schema(feld, "String erwartet")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
