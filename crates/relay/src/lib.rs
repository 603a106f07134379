//! stillepost-relay – Raum-Registry und Verbindungs-Handling
//!
//! Dieses Crate implementiert den Echtzeit-Kern von Stillepost: das
//! In-Memory-Verzeichnis der verbundenen Clients pro Raum und die
//! State Machine, die einen einzelnen Raum-Socket an Codec, Registry
//! und Persistenz-Senke anbindet.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket-Route (ws_router)
//!     |
//!     v
//! RaumVerbindung (pro Socket ein Task)
//!     |  State Machine: Offen -> Aktiv -> Geschlossen
//!     |
//!     +-- Envelope-Codec   (stillepost-protocol)
//!     +-- RaumRegistry     (wer ist in welchem Raum, Broadcast)
//!     +-- PersistenzSenke  (best-effort Ablage, losgeloester Task)
//! ```

pub mod registry;
pub mod routen;
pub mod senke;
pub mod state;
pub mod verbindung;

// Bequeme Re-Exporte
pub use registry::{ClientSender, RaumClients, RaumRegistry};
pub use routen::ws_router;
pub use senke::{NoopSenke, PersistenzSenke};
pub use state::RelayState;
pub use verbindung::{RaumVerbindung, VerbindungsZustand};
