//! Integration-Tests fuer das RaumRepository (In-Memory SQLite)

use chrono::{Duration, Utc};
use stillepost_db::{
    models::NeuerRaum, DbError, NachrichtenRepository, RaumRepository, SqliteDb,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

fn neuer_raum(id: &str) -> NeuerRaum<'_> {
    NeuerRaum {
        id,
        password_hash: None,
        owner_public_key: "owner-key",
        owner_fingerprint: "owner-fp",
        expires_at: Utc::now() + Duration::hours(24),
    }
}

#[tokio::test]
async fn raum_erstellen_und_laden() {
    let db = db().await;

    let raum = RaumRepository::erstellen(&db, neuer_raum("raum123456"))
        .await
        .unwrap();
    assert_eq!(raum.id, "raum123456");
    assert!(raum.guest_public_key.is_none());
    assert!(raum.updated_at.is_none());

    let geladen = db.laden("raum123456").await.unwrap().unwrap();
    assert_eq!(geladen.id, raum.id);
    assert_eq!(geladen.owner_fingerprint, "owner-fp");
    // Zeitstempel ueberleben den Text-Round-Trip millisekundengenau
    assert_eq!(geladen.created_at, raum.created_at);
}

#[tokio::test]
async fn unbekannter_raum_ist_none() {
    let db = db().await;
    assert!(db.laden("gibt-es-nicht").await.unwrap().is_none());
}

#[tokio::test]
async fn doppelte_raum_id_abgelehnt() {
    let db = db().await;

    RaumRepository::erstellen(&db, neuer_raum("raum123456"))
        .await
        .unwrap();
    let fehler = RaumRepository::erstellen(&db, neuer_raum("raum123456"))
        .await
        .unwrap_err();
    assert!(matches!(fehler, DbError::Eindeutigkeit(_)), "{fehler}");
}

#[tokio::test]
async fn gast_setzen_genau_einmal() {
    let db = db().await;
    RaumRepository::erstellen(&db, neuer_raum("raum123456"))
        .await
        .unwrap();

    let raum = db
        .gast_setzen("raum123456", "guest-key", "guest-fp")
        .await
        .unwrap();
    assert_eq!(raum.guest_public_key.as_deref(), Some("guest-key"));
    assert_eq!(raum.guest_fingerprint.as_deref(), Some("guest-fp"));
    assert!(raum.updated_at.is_some());

    let fehler = db
        .gast_setzen("raum123456", "zweiter-key", "zweiter-fp")
        .await
        .unwrap_err();
    assert!(matches!(fehler, DbError::UngueltigeDaten(_)));
}

#[tokio::test]
async fn gast_setzen_fuer_unbekannten_raum() {
    let db = db().await;
    let fehler = db
        .gast_setzen("gibt-es-nicht", "key", "fp")
        .await
        .unwrap_err();
    assert!(matches!(fehler, DbError::NichtGefunden(_)));
}

#[tokio::test]
async fn aktivitaet_beruehren_setzt_updated_at() {
    let db = db().await;
    RaumRepository::erstellen(&db, neuer_raum("raum123456"))
        .await
        .unwrap();

    db.aktivitaet_beruehren("raum123456").await.unwrap();
    let raum = db.laden("raum123456").await.unwrap().unwrap();
    assert!(raum.updated_at.is_some());

    let fehler = db.aktivitaet_beruehren("fremd").await.unwrap_err();
    assert!(matches!(fehler, DbError::NichtGefunden(_)));
}

#[tokio::test]
async fn abgelaufene_raeume_werden_samt_nachrichten_geloescht() {
    let db = db().await;

    let abgelaufen = NeuerRaum {
        expires_at: Utc::now() - Duration::hours(1),
        ..neuer_raum("alt1234567")
    };
    RaumRepository::erstellen(&db, abgelaufen).await.unwrap();
    RaumRepository::erstellen(&db, neuer_raum("frisch12345"))
        .await
        .unwrap();

    NachrichtenRepository::erstellen(
        &db,
        stillepost_db::models::NeueNachricht {
            id: "msg1234567",
            room_id: "alt1234567",
            sender: "fp",
            content: "ciphertext",
            ts: Utc::now(),
        },
    )
    .await
    .unwrap();

    let ergebnis = db.abgelaufene_loeschen(Utc::now()).await.unwrap();
    assert_eq!(ergebnis.geloeschte_raeume, 1);
    assert_eq!(ergebnis.geloeschte_nachrichten, 1);

    assert!(db.laden("alt1234567").await.unwrap().is_none());
    assert!(db.laden("frisch12345").await.unwrap().is_some());

    // Zweiter Lauf findet nichts mehr
    let leer = db.abgelaufene_loeschen(Utc::now()).await.unwrap();
    assert_eq!(leer.geloeschte_raeume, 0);
    assert_eq!(leer.geloeschte_nachrichten, 0);
}
