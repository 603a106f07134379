//! Persistenz-Senke auf Basis der SQLite-Repositories
//!
//! Adapter zwischen der schmalen Senken-Schnittstelle des Relays und
//! den Datenbank-Repositories. Fehler werden nach oben gereicht und
//! vom Relay ausschliesslich geloggt.

use async_trait::async_trait;

use stillepost_core::RoomId;
use stillepost_db::{models::NeueNachricht, NachrichtenRepository, RaumRepository, SqliteDb};
use stillepost_protocol::Envelope;
use stillepost_relay::PersistenzSenke;

/// Senke die akzeptierte Envelopes in SQLite ablegt
pub struct DbSenke {
    db: SqliteDb,
}

impl DbSenke {
    /// Erstellt eine neue DbSenke
    pub fn neu(db: SqliteDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersistenzSenke for DbSenke {
    async fn nachricht_speichern(&self, envelope: &Envelope) -> anyhow::Result<()> {
        NachrichtenRepository::erstellen(
            &self.db,
            NeueNachricht {
                id: envelope.id.als_str(),
                room_id: envelope.raum_id.als_str(),
                sender: envelope.sender.als_str(),
                content: &envelope.content,
                ts: envelope.ts,
            },
        )
        .await?;
        Ok(())
    }

    async fn raum_aktivitaet(&self, raum_id: &RoomId) -> anyhow::Result<()> {
        RaumRepository::aktivitaet_beruehren(&self.db, raum_id.als_str()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use stillepost_core::{Fingerprint, MessageId};
    use stillepost_db::models::NeuerRaum;
    use stillepost_protocol::EnvelopeArt;

    async fn db_mit_raum() -> SqliteDb {
        let db = SqliteDb::in_memory().await.unwrap();
        RaumRepository::erstellen(
            &db,
            NeuerRaum {
                id: "raum123456",
                password_hash: None,
                owner_public_key: "key",
                owner_fingerprint: "fp",
                expires_at: Utc::now() + Duration::hours(1),
            },
        )
        .await
        .unwrap();
        db
    }

    fn envelope() -> Envelope {
        Envelope {
            id: MessageId::neu("msg1234567"),
            art: EnvelopeArt::Client,
            raum_id: RoomId::neu("raum123456"),
            sender: Fingerprint::neu("fp-alice"),
            ts: Utc::now(),
            content: "ciphertext".into(),
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn senke_legt_nachricht_ab_und_beruehrt_den_raum() {
        let db = db_mit_raum().await;
        let senke = DbSenke::neu(db.clone());

        senke.nachricht_speichern(&envelope()).await.unwrap();
        senke
            .raum_aktivitaet(&RoomId::neu("raum123456"))
            .await
            .unwrap();

        let nachrichten = db.fuer_raum("raum123456").await.unwrap();
        assert_eq!(nachrichten.len(), 1);
        assert_eq!(nachrichten[0].content, "ciphertext");

        let raum = db.laden("raum123456").await.unwrap().unwrap();
        assert!(raum.updated_at.is_some());
    }

    #[tokio::test]
    async fn senke_meldet_fehler_fuer_unbekannten_raum() {
        let db = db_mit_raum().await;
        let senke = DbSenke::neu(db);

        let fremd = RoomId::neu("geisterraum");
        assert!(senke.raum_aktivitaet(&fremd).await.is_err());
    }
}
