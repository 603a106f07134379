//! Fehlertaxonomie der Envelope-Validierung
//!
//! Alle Codes sind pro Frame und nie fatal: der fehlerhafte Frame wird
//! verworfen, der Verursacher erhaelt eine Fehler-Notiz, die Verbindung
//! bleibt bestehen.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Fehler-Notizen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FehlerCode {
    /// Frame ist kein parsebares JSON
    MalformedMessage,
    /// JSON parsebar, aber Felder fehlen, passen nicht oder sind
    /// nicht aufloesbar
    InvalidMessageSchema,
    /// Rueckfall wenn kein konkreter Grund bekannt ist
    UnknownError,
}

impl FehlerCode {
    /// Gibt den Code in Draht-Schreibweise zurueck
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::MalformedMessage => "MALFORMED_MESSAGE",
            Self::InvalidMessageSchema => "INVALID_MESSAGE_SCHEMA",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

// ---------------------------------------------------------------------------
// NachrichtenFehler
// ---------------------------------------------------------------------------

/// Validierungsfehler eines einzelnen eingehenden Frames
///
/// Traegt neben dem Code eine menschenlesbare Begruendung und optional
/// maschinenlesbaren Kontext, der in die Metadata der Fehler-Notiz wandert.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{nachricht}")]
pub struct NachrichtenFehler {
    pub code: FehlerCode,
    pub nachricht: String,
    pub context: Option<Map<String, Value>>,
}

impl NachrichtenFehler {
    /// Frame war kein parsebares JSON
    pub fn malformed(nachricht: impl Into<String>) -> Self {
        Self {
            code: FehlerCode::MalformedMessage,
            nachricht: nachricht.into(),
            context: None,
        }
    }

    /// Schema-Verletzung; benennt das erste fehlerhafte Feld
    pub fn schema(feld: &str, grund: impl std::fmt::Display) -> Self {
        Self {
            code: FehlerCode::InvalidMessageSchema,
            nachricht: format!("Schema-Fehler fuer {feld}: {grund}"),
            context: None,
        }
    }

    /// Unbekannter Fehler ohne konkreten Grund
    pub fn unbekannt() -> Self {
        Self {
            code: FehlerCode::UnknownError,
            nachricht: "Unbekannter Fehler".into(),
            context: None,
        }
    }

    /// Haengt maschinenlesbaren Kontext an
    pub fn mit_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
