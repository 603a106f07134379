//! Fingerprint-Berechnung fuer oeffentliche Schluessel
//!
//! Der Fingerprint eines Teilnehmers ist der SHA-256-Hex-Digest seines
//! Schluesselmaterials. Clients berechnen ihn selbst; der Server leitet
//! ihn nur dort ab, wo ein oeffentlicher Schluessel eingereicht wird
//! (Raum anlegen, Raum beitreten).

use sha2::{Digest, Sha256};

use crate::types::Fingerprint;

/// Berechnet den Fingerprint zu einem oeffentlichen Schluessel
pub fn von_public_key(public_key: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(public_key.as_bytes());
    let digest = hasher.finalize();

    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Fingerprint::neu(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_ist_deterministisch() {
        let a = von_public_key("mein-schluessel");
        let b = von_public_key("mein-schluessel");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_ist_sha256_hex() {
        let fp = von_public_key("test");
        assert_eq!(fp.als_str().len(), 64);
        // Bekannter SHA-256-Digest von "test"
        assert_eq!(
            fp.als_str(),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn verschiedene_schluessel_verschiedene_fingerprints() {
        assert_ne!(von_public_key("a"), von_public_key("b"));
    }
}
