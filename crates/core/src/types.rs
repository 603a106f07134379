//! Gemeinsame Identifikationstypen fuer Stillepost
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Auf dem Draht
//! sind alle drei blosse Strings (`#[serde(transparent)]`).

use serde::{Deserialize, Serialize};

use crate::ids;

/// Eindeutige Raum-ID
///
/// Wird nicht vom Relay vergeben sondern clientseitig erzeugt; nach dem
/// Loeschen eines Raums wird die ID nie wiederverwendet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Erstellt eine RoomId aus einem vorhandenen String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als &str zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint eines Teilnehmers
///
/// Clientseitig aus dem oeffentlichen Schluessel abgeleitet; nur innerhalb
/// eines Raums eindeutig, globale Eindeutigkeit wird nicht erzwungen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Erstellt einen Fingerprint aus einem vorhandenen String
    pub fn neu(fingerprint: impl Into<String>) -> Self {
        Self(fingerprint.into())
    }

    /// Gibt den Fingerprint als &str zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Eindeutige Nachrichten-ID (feste Laenge, siehe [`ids::ID_LAENGE`])
///
/// Client-Envelopes bringen ihre ID mit; fuer Server- und Fehler-Notizen
/// erzeugt das Relay eine frische ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Erstellt eine MessageId aus einem vorhandenen String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Erzeugt eine neue zufaellige MessageId
    pub fn generieren() -> Self {
        Self(ids::nachrichten_id())
    }

    /// Gibt die ID als &str zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_generieren_eindeutig() {
        let a = MessageId::generieren();
        let b = MessageId::generieren();
        assert_ne!(a, b, "Zwei neue MessageIds muessen verschieden sein");
    }

    #[test]
    fn message_id_generieren_laenge() {
        let id = MessageId::generieren();
        assert_eq!(id.als_str().len(), ids::ID_LAENGE);
    }

    #[test]
    fn room_id_display_ohne_dekoration() {
        let id = RoomId::neu("abc123defg");
        assert_eq!(id.to_string(), "abc123defg");
    }

    #[test]
    fn ids_sind_serde_transparent() {
        let fp = Fingerprint::neu("deadbeef");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, "\"deadbeef\"");
        let fp2: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, fp2);
    }
}
