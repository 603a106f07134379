//! Generierung kurzer URL-sicherer IDs
//!
//! Nachrichten- und Raum-IDs sind 10 Zeichen lang und bestehen aus
//! Kleinbuchstaben und Ziffern. Das Alphabet ist mit den Clients
//! abgestimmt, damit server- und clientseitig erzeugte IDs dieselbe
//! Form haben.

use rand::Rng;

/// Alphabet fuer alle Stillepost-IDs
pub const STANDARD_ALPHABET: &[u8] = b"1234567890abcdefghijklmnopqrstuvwxyz";

/// Feste Laenge einer ID (Nachrichten und Raeume)
pub const ID_LAENGE: usize = 10;

/// Erzeugt eine zufaellige ID der gegebenen Laenge aus dem Standard-Alphabet
pub fn generieren(laenge: usize) -> String {
    let mut rng = rand::rng();
    (0..laenge)
        .map(|_| {
            let idx = rng.random_range(0..STANDARD_ALPHABET.len());
            STANDARD_ALPHABET[idx] as char
        })
        .collect()
}

/// Erzeugt eine neue Nachrichten-ID
pub fn nachrichten_id() -> String {
    generieren(ID_LAENGE)
}

/// Erzeugt eine neue Raum-ID
pub fn raum_id() -> String {
    generieren(ID_LAENGE)
}
