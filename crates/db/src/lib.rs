//! stillepost-db – Datenbank-Abstraktion
//!
//! Repository-Pattern ueber SQLite (sqlx). Raum-Existenz gehoert dieser
//! Schicht; das Relay kennt nur die schmale Senken-Schnittstelle und
//! funktioniert auch wenn die Datenbank wegbricht.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

// Bequeme Re-Exporte
pub use error::DbError;
pub use repository::{DatabaseConfig, DbResult, NachrichtenRepository, RaumRepository};
pub use sqlite::SqliteDb;
