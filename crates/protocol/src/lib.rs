//! stillepost-protocol – Draht-Format des Raum-Sockets
//!
//! Dieses Crate definiert den Envelope (die Einheit der Socket-
//! Kommunikation), dessen Kodierung/Dekodierung und die Fehlertaxonomie
//! der Validierung. Der Inhalt eines Envelopes ist aus Sicht des Relays
//! opak – Clients verschluesseln Ende-zu-Ende, das Relay entschluesselt nie.

pub mod envelope;
pub mod error;

// Bequeme Re-Exporte
pub use envelope::{AbgeleiteteFelder, Envelope, EnvelopeArt, RELAY_ABSENDER};
pub use error::{FehlerCode, NachrichtenFehler};
