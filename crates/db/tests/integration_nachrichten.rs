//! Integration-Tests fuer das NachrichtenRepository (In-Memory SQLite)

use chrono::{Duration, TimeZone, Utc};
use stillepost_db::{
    models::{NeueNachricht, NeuerRaum},
    DbError, NachrichtenRepository, RaumRepository, SqliteDb,
};

async fn db_mit_raum(raum_id: &str) -> SqliteDb {
    let db = SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden");

    RaumRepository::erstellen(
        &db,
        NeuerRaum {
            id: raum_id,
            password_hash: None,
            owner_public_key: "owner-key",
            owner_fingerprint: "owner-fp",
            expires_at: Utc::now() + Duration::hours(24),
        },
    )
    .await
    .expect("Raum anlegen fehlgeschlagen");

    db
}

#[tokio::test]
async fn nachricht_speichern_und_laden() {
    let db = db_mit_raum("raum123456").await;
    let ts = Utc.timestamp_millis_opt(1_712_345_678_901).unwrap();

    let nachricht = NachrichtenRepository::erstellen(
        &db,
        NeueNachricht {
            id: "msg1234567",
            room_id: "raum123456",
            sender: "fp-alice",
            content: "ciphertext",
            ts,
        },
    )
    .await
    .unwrap();
    assert_eq!(nachricht.content, "ciphertext");

    let geladen = db.fuer_raum("raum123456").await.unwrap();
    assert_eq!(geladen.len(), 1);
    assert_eq!(geladen[0].sender, "fp-alice");
    assert_eq!(geladen[0].ts, ts, "Millisekunden ueberleben die Ablage");
}

#[tokio::test]
async fn nachrichten_chronologisch_sortiert() {
    let db = db_mit_raum("raum123456").await;
    let basis = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

    // Absichtlich in verdrehter Reihenfolge einfuegen
    for (id, offset_ms) in [("msg-c", 3000i64), ("msg-a", 1000), ("msg-b", 2000)] {
        NachrichtenRepository::erstellen(
            &db,
            NeueNachricht {
                id,
                room_id: "raum123456",
                sender: "fp",
                content: "x",
                ts: basis + Duration::milliseconds(offset_ms),
            },
        )
        .await
        .unwrap();
    }

    let geladen = db.fuer_raum("raum123456").await.unwrap();
    let ids: Vec<&str> = geladen.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["msg-a", "msg-b", "msg-c"]);
}

#[tokio::test]
async fn leerer_raum_liefert_leere_liste() {
    let db = db_mit_raum("raum123456").await;
    assert!(db.fuer_raum("raum123456").await.unwrap().is_empty());
    assert!(db.fuer_raum("anderer").await.unwrap().is_empty());
}

#[tokio::test]
async fn doppelte_nachrichten_id_abgelehnt() {
    let db = db_mit_raum("raum123456").await;
    let neue = NeueNachricht {
        id: "msg1234567",
        room_id: "raum123456",
        sender: "fp",
        content: "x",
        ts: Utc::now(),
    };

    NachrichtenRepository::erstellen(&db, neue.clone())
        .await
        .unwrap();
    let fehler = NachrichtenRepository::erstellen(&db, neue)
        .await
        .unwrap_err();
    assert!(matches!(fehler, DbError::Eindeutigkeit(_)));
}

#[tokio::test]
async fn nachricht_fuer_unbekannten_raum_scheitert() {
    let db = db_mit_raum("raum123456").await;

    // Fremdschluessel verhindert verwaiste Nachrichten
    let fehler = NachrichtenRepository::erstellen(
        &db,
        NeueNachricht {
            id: "msg1234567",
            room_id: "geisterraum",
            sender: "fp",
            content: "x",
            ts: Utc::now(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(fehler, DbError::Sqlx(_)));
}
