//! WebSocket-Route des Relays
//!
//! `GET /ws/room/:room_id?fingerprint=...` – der Upgrade-Handler zieht
//! die Raum-ID aus dem Pfad und den Fingerprint aus den Query-Parametern
//! und uebergibt den Socket an eine `RaumVerbindung` in deren eigenem
//! Task.

use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use stillepost_core::{Fingerprint, RoomId};

use crate::state::RelayState;
use crate::verbindung::RaumVerbindung;

/// Query-Parameter der WebSocket-Route
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Fingerprint des Teilnehmers (unauthentifizierter String)
    pub fingerprint: String,
}

/// Axum-Router fuer den Raum-Socket
pub fn ws_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/ws/room/:room_id", get(ws_handler))
        .with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(params): Query<WsParams>,
    State(state): State<Arc<RelayState>>,
) -> impl IntoResponse {
    let raum_id = RoomId::neu(room_id);
    let fingerprint = Fingerprint::neu(params.fingerprint);

    tracing::debug!(raum = %raum_id, fingerprint = %fingerprint, "WebSocket-Upgrade");

    ws.on_upgrade(move |socket| {
        RaumVerbindung::neu(state, raum_id, fingerprint).verarbeiten(socket)
    })
}
