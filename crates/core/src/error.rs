//! Fehlertypen fuer Stillepost
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]`
//! konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Stillepost
pub type Result<T> = std::result::Result<T, StillepostError>;

/// Alle moeglichen Fehler im Stillepost-System
#[derive(Debug, Error)]
pub enum StillepostError {
    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Passwoerter ---
    #[error("Passwort-Fehler: {0}")]
    Passwort(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl StillepostError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Konfigurationsfehler
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = StillepostError::Passwort("Ungueltiges Hash-Format".into());
        assert_eq!(e.to_string(), "Passwort-Fehler: Ungueltiges Hash-Format");
    }

    #[test]
    fn konfigurationsfehler_helper() {
        let e = StillepostError::konfiguration("Port fehlt");
        assert!(matches!(e, StillepostError::Konfiguration(_)));
        assert!(e.to_string().contains("Port fehlt"));
    }
}
