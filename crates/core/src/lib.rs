//! stillepost-core – Gemeinsame Typen, IDs und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Stillepost-Crates gemeinsam genutzt werden.

pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Result, StillepostError};
pub use types::{Fingerprint, MessageId, RoomId};
