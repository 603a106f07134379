//! Datenbankmodelle fuer Stillepost
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank. Sie sind
//! von den Domain-Typen getrennt und dienen als reine
//! Datenuebertragungsobjekte.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raeume
// ---------------------------------------------------------------------------

/// Raum-Datensatz aus der Datenbank
///
/// `password_hash` ist ein Argon2id-PHC-String und verlaesst die
/// Persistenzschicht nie in Richtung Client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaumRecord {
    pub id: String,
    pub password_hash: Option<String>,
    pub owner_public_key: String,
    pub owner_fingerprint: String,
    pub guest_public_key: Option<String>,
    pub guest_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// Daten zum Anlegen eines neuen Raums
#[derive(Debug, Clone)]
pub struct NeuerRaum<'a> {
    pub id: &'a str,
    pub password_hash: Option<&'a str>,
    pub owner_public_key: &'a str,
    pub owner_fingerprint: &'a str,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Nachrichten
// ---------------------------------------------------------------------------

/// Nachrichten-Datensatz aus der Datenbank
///
/// `content` ist der unveraenderte Ciphertext des Clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NachrichtRecord {
    pub id: String,
    pub room_id: String,
    pub sender: String,
    pub content: String,
    pub ts: DateTime<Utc>,
}

/// Daten zum Speichern einer neuen Nachricht
#[derive(Debug, Clone)]
pub struct NeueNachricht<'a> {
    pub id: &'a str,
    pub room_id: &'a str,
    pub sender: &'a str,
    pub content: &'a str,
    pub ts: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Aufraeumen
// ---------------------------------------------------------------------------

/// Ergebnis eines Aufraeumlaufs ueber abgelaufene Raeume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AufraeumErgebnis {
    pub geloeschte_raeume: u64,
    pub geloeschte_nachrichten: u64,
}
