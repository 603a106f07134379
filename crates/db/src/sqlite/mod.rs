//! SQLite-Backend
//!
//! Implementiert die Repository-Traits auf einem sqlx-Pool.

pub mod nachrichten;
pub mod pool;
pub mod raeume;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::repository::DbResult;

/// Formatiert einen Zeitstempel fuer die Ablage als Text
///
/// Festes UTC-Format mit Millisekunden, damit Textvergleiche in SQL
/// der chronologischen Ordnung entsprechen.
pub(crate) fn zeit_als_text(zeit: &DateTime<Utc>) -> String {
    zeit.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parst einen gespeicherten Zeitstempel
pub(crate) fn zeit_aus_text(text: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltiger Zeitstempel '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zeit_round_trip_mit_millisekunden() {
        let zeit = Utc.timestamp_millis_opt(1_712_345_678_901).unwrap();
        let text = zeit_als_text(&zeit);
        assert_eq!(zeit_aus_text(&text).unwrap(), zeit);
    }

    #[test]
    fn zeit_text_ist_lexikographisch_sortierbar() {
        let frueh = Utc.timestamp_millis_opt(1_000).unwrap();
        let spaet = Utc.timestamp_millis_opt(2_000_000_000_000).unwrap();
        assert!(zeit_als_text(&frueh) < zeit_als_text(&spaet));
    }

    #[test]
    fn kaputter_zeitstempel_wird_abgelehnt() {
        assert!(zeit_aus_text("gestern mittag").is_err());
    }
}
