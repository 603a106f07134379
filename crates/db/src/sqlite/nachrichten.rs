//! SQLite-Implementierung des NachrichtenRepository

use sqlx::Row as _;

use crate::error::DbError;
use crate::models::{NachrichtRecord, NeueNachricht};
use crate::repository::{DbResult, NachrichtenRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{zeit_als_text, zeit_aus_text};

impl NachrichtenRepository for SqliteDb {
    async fn erstellen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        sqlx::query(
            "INSERT INTO messages (id, room_id, sender, content, ts)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(data.id)
        .bind(data.room_id)
        .bind(data.sender)
        .bind(data.content)
        .bind(zeit_als_text(&data.ts))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let fehler = DbError::from(e);
            if fehler.ist_eindeutigkeit() {
                DbError::Eindeutigkeit(format!("Nachrichten-ID bereits vergeben: {}", data.id))
            } else {
                fehler
            }
        })?;

        Ok(NachrichtRecord {
            id: data.id.to_string(),
            room_id: data.room_id.to_string(),
            sender: data.sender.to_string(),
            content: data.content.to_string(),
            ts: data.ts,
        })
    }

    async fn fuer_raum(&self, room_id: &str) -> DbResult<Vec<NachrichtRecord>> {
        let rows = sqlx::query(
            "SELECT id, room_id, sender, content, ts
             FROM messages
             WHERE room_id = ?
             ORDER BY ts ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_nachricht).collect()
    }
}

pub(crate) fn row_to_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    let ts = zeit_aus_text(&row.try_get::<String, _>("ts")?)?;

    Ok(NachrichtRecord {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        sender: row.try_get("sender")?,
        content: row.try_get("content")?,
        ts,
    })
}
