//! Raum-Passwoerter mit Argon2id
//!
//! Raeume koennen optional mit einem Passwort versehen werden, das den
//! HTTP-Beitrittsfluss schuetzt. Gespeichert wird ausschliesslich der
//! PHC-String; der Socket selbst kennt keine Passwoerter.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

use stillepost_core::StillepostError;

/// Argon2id-Parameter gemaess OWASP-Empfehlung
///
/// - Speicher: 64 MiB
/// - Iterationen: 3
/// - Parallelismus: 1
fn argon2_instanz() -> Argon2<'static> {
    let params = Params::new(
        64 * 1024, // m_cost: 64 MiB
        3,         // t_cost: 3 Iterationen
        1,         // p_cost: 1 Thread
        None,      // output_len: Standard (32 Bytes)
    )
    .expect("Argon2-Parameter ungueltig");

    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
}

/// Hasht ein Passwort mit Argon2id und einem zufaelligen Salt
///
/// Gibt den PHC-String zurueck (inkl. Algorithmus, Parameter und Salt).
pub fn hashen(passwort: &str) -> Result<String, StillepostError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2_instanz()
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StillepostError::Passwort(e.to_string()))
}

/// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
///
/// Gibt `true` zurueck wenn das Passwort korrekt ist.
pub fn verifizieren(passwort: &str, hash: &str) -> Result<bool, StillepostError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| StillepostError::Passwort(format!("Ungueltiges Hash-Format: {e}")))?;

    match argon2_instanz().verify_password(passwort.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(StillepostError::Passwort(e.to_string())),
    }
}
