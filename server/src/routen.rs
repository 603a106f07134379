//! HTTP-API fuer die Raum-Verwaltung
//!
//! Schmale CRUD-Schicht neben dem Socket: Raum anlegen, laden, Gast
//! eintragen, Passwort pruefen. Das Passwort schuetzt nur diesen
//! HTTP-Fluss; die Socket-Schicht kennt ausschliesslich Fingerprints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use stillepost_core::{fingerprint, ids};
use stillepost_db::{
    models::{NachrichtRecord, NeuerRaum, RaumRecord},
    DbError, NachrichtenRepository, RaumRepository, SqliteDb,
};

use crate::passwort;

// ---------------------------------------------------------------------------
// Zustand und Router
// ---------------------------------------------------------------------------

/// Geteilter Zustand der HTTP-API
pub struct ApiZustand {
    pub db: SqliteDb,
    /// Lebensdauer neu angelegter Raeume
    pub raum_ttl: Duration,
}

/// Axum-Router fuer die Raum-Verwaltung
pub fn api_router(zustand: Arc<ApiZustand>) -> Router {
    Router::new()
        .route("/api/room", post(raum_erstellen))
        .route("/api/room/:room_id", get(raum_laden))
        .route("/api/room/:room_id/join", post(raum_beitreten))
        .route("/api/room/:room_id/password", post(passwort_pruefen))
        .with_state(zustand)
}

// ---------------------------------------------------------------------------
// Anfrage- und Antwort-Typen
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RaumErstellenAnfrage {
    /// Clientseitig erzeugte Raum-ID; fehlt sie, vergibt der Server eine
    room_id: Option<String>,
    public_key: String,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BeitrittsAnfrage {
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct PasswortAnfrage {
    password: String,
}

/// Raum-Darstellung fuer Clients
///
/// Der Passwort-Hash und die oeffentlichen Schluessel der Gegenseite
/// bleiben serverseitig.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RaumAntwort {
    id: String,
    owner_fingerprint: String,
    guest_fingerprint: Option<String>,
    password_protected: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
    messages: Vec<NachrichtRecord>,
}

fn raum_antwort(raum: RaumRecord, messages: Vec<NachrichtRecord>) -> RaumAntwort {
    RaumAntwort {
        id: raum.id,
        owner_fingerprint: raum.owner_fingerprint,
        guest_fingerprint: raum.guest_fingerprint,
        password_protected: raum.password_hash.is_some(),
        created_at: raum.created_at,
        updated_at: raum.updated_at,
        expires_at: raum.expires_at,
        messages,
    }
}

// ---------------------------------------------------------------------------
// Fehler-Abbildung
// ---------------------------------------------------------------------------

type ApiFehler = (StatusCode, Json<Value>);

fn fehler_antwort(status: StatusCode, nachricht: impl Into<String>) -> ApiFehler {
    (status, Json(json!({ "error": nachricht.into() })))
}

fn db_fehler(fehler: DbError) -> ApiFehler {
    match fehler {
        DbError::NichtGefunden(_) => fehler_antwort(StatusCode::NOT_FOUND, "Raum nicht gefunden"),
        DbError::Eindeutigkeit(_) => {
            fehler_antwort(StatusCode::CONFLICT, "Raum-ID bereits vergeben")
        }
        DbError::UngueltigeDaten(grund) => fehler_antwort(StatusCode::BAD_REQUEST, grund),
        sonst => {
            tracing::error!(fehler = %sonst, "Datenbank-Fehler in der HTTP-API");
            fehler_antwort(StatusCode::INTERNAL_SERVER_ERROR, "Interner Fehler")
        }
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// `POST /api/room` – legt einen neuen Raum an
async fn raum_erstellen(
    State(zustand): State<Arc<ApiZustand>>,
    Json(anfrage): Json<RaumErstellenAnfrage>,
) -> Result<impl IntoResponse, ApiFehler> {
    let raum_id = anfrage.room_id.unwrap_or_else(ids::raum_id);
    let owner_fingerprint = fingerprint::von_public_key(&anfrage.public_key);

    let password_hash = match anfrage.password.as_deref() {
        Some(pw) if !pw.is_empty() => Some(passwort::hashen(pw).map_err(|e| {
            tracing::error!(fehler = %e, "Passwort-Hashing fehlgeschlagen");
            fehler_antwort(StatusCode::INTERNAL_SERVER_ERROR, "Interner Fehler")
        })?),
        _ => None,
    };

    let raum = RaumRepository::erstellen(
        &zustand.db,
        NeuerRaum {
            id: &raum_id,
            password_hash: password_hash.as_deref(),
            owner_public_key: &anfrage.public_key,
            owner_fingerprint: owner_fingerprint.als_str(),
            expires_at: Utc::now() + zustand.raum_ttl,
        },
    )
    .await
    .map_err(db_fehler)?;

    tracing::info!(raum = %raum.id, "Raum angelegt");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "room": raum_antwort(raum, Vec::new()) })),
    ))
}

/// `GET /api/room/:room_id` – laedt einen Raum samt Nachrichten
async fn raum_laden(
    State(zustand): State<Arc<ApiZustand>>,
    Path(room_id): Path<String>,
) -> Result<Json<Value>, ApiFehler> {
    let raum = zustand
        .db
        .laden(&room_id)
        .await
        .map_err(db_fehler)?
        .ok_or_else(|| fehler_antwort(StatusCode::NOT_FOUND, "Raum nicht gefunden"))?;

    let messages = zustand.db.fuer_raum(&room_id).await.map_err(db_fehler)?;

    Ok(Json(json!({ "room": raum_antwort(raum, messages) })))
}

/// `POST /api/room/:room_id/join` – traegt den Gast-Schluessel ein
async fn raum_beitreten(
    State(zustand): State<Arc<ApiZustand>>,
    Path(room_id): Path<String>,
    Json(anfrage): Json<BeitrittsAnfrage>,
) -> Result<Json<Value>, ApiFehler> {
    let gast_fingerprint = fingerprint::von_public_key(&anfrage.public_key);

    let raum = zustand
        .db
        .gast_setzen(&room_id, &anfrage.public_key, gast_fingerprint.als_str())
        .await
        .map_err(db_fehler)?;

    tracing::info!(raum = %raum.id, gast = %gast_fingerprint, "Gast beigetreten");
    Ok(Json(json!({ "room": raum_antwort(raum, Vec::new()) })))
}

/// `POST /api/room/:room_id/password` – prueft das Raum-Passwort
async fn passwort_pruefen(
    State(zustand): State<Arc<ApiZustand>>,
    Path(room_id): Path<String>,
    Json(anfrage): Json<PasswortAnfrage>,
) -> Result<StatusCode, ApiFehler> {
    let raum = zustand
        .db
        .laden(&room_id)
        .await
        .map_err(db_fehler)?
        .ok_or_else(|| fehler_antwort(StatusCode::NOT_FOUND, "Raum nicht gefunden"))?;

    let hash = raum
        .password_hash
        .ok_or_else(|| fehler_antwort(StatusCode::BAD_REQUEST, "Raum hat kein Passwort"))?;

    let korrekt = passwort::verifizieren(&anfrage.password, &hash).map_err(|e| {
        tracing::error!(fehler = %e, "Passwort-Pruefung fehlgeschlagen");
        fehler_antwort(StatusCode::INTERNAL_SERVER_ERROR, "Interner Fehler")
    })?;

    if korrekt {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(fehler_antwort(StatusCode::UNAUTHORIZED, "Falsches Passwort"))
    }
}
