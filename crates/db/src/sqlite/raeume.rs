//! SQLite-Implementierung des RaumRepository

use chrono::{DateTime, Utc};
use sqlx::Row as _;

use crate::error::DbError;
use crate::models::{AufraeumErgebnis, NeuerRaum, RaumRecord};
use crate::repository::{DbResult, RaumRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{zeit_als_text, zeit_aus_text};

impl RaumRepository for SqliteDb {
    async fn erstellen(&self, data: NeuerRaum<'_>) -> DbResult<RaumRecord> {
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO rooms
             (id, password_hash, owner_public_key, owner_fingerprint, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(data.id)
        .bind(data.password_hash)
        .bind(data.owner_public_key)
        .bind(data.owner_fingerprint)
        .bind(zeit_als_text(&created_at))
        .bind(zeit_als_text(&data.expires_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let fehler = DbError::from(e);
            if fehler.ist_eindeutigkeit() {
                DbError::Eindeutigkeit(format!("Raum-ID bereits vergeben: {}", data.id))
            } else {
                fehler
            }
        })?;

        Ok(RaumRecord {
            id: data.id.to_string(),
            password_hash: data.password_hash.map(str::to_string),
            owner_public_key: data.owner_public_key.to_string(),
            owner_fingerprint: data.owner_fingerprint.to_string(),
            guest_public_key: None,
            guest_fingerprint: None,
            created_at,
            updated_at: None,
            expires_at: data.expires_at,
        })
    }

    async fn laden(&self, id: &str) -> DbResult<Option<RaumRecord>> {
        let row = sqlx::query(
            "SELECT id, password_hash, owner_public_key, owner_fingerprint,
                    guest_public_key, guest_fingerprint, created_at, updated_at, expires_at
             FROM rooms WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_raum(&r)).transpose()
    }

    async fn gast_setzen(
        &self,
        id: &str,
        public_key: &str,
        fingerprint: &str,
    ) -> DbResult<RaumRecord> {
        let raum = self
            .laden(id)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Raum {id}")))?;

        if raum.guest_public_key.is_some() {
            return Err(DbError::UngueltigeDaten(format!(
                "Raum {id} hat bereits einen Gast"
            )));
        }

        sqlx::query(
            "UPDATE rooms SET guest_public_key = ?, guest_fingerprint = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(public_key)
        .bind(fingerprint)
        .bind(zeit_als_text(&Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.laden(id)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Raum {id}")))
    }

    async fn aktivitaet_beruehren(&self, id: &str) -> DbResult<()> {
        let betroffen = sqlx::query("UPDATE rooms SET updated_at = ? WHERE id = ?")
            .bind(zeit_als_text(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if betroffen == 0 {
            return Err(DbError::nicht_gefunden(format!("Raum {id}")));
        }
        Ok(())
    }

    async fn abgelaufene_loeschen(&self, stichtag: DateTime<Utc>) -> DbResult<AufraeumErgebnis> {
        let stichtag_text = zeit_als_text(&stichtag);

        // Nachrichten zuerst, sonst verletzen die Raum-Loeschungen die
        // Fremdschluessel-Beziehung
        let geloeschte_nachrichten = sqlx::query(
            "DELETE FROM messages
             WHERE room_id IN (SELECT id FROM rooms WHERE expires_at < ?)",
        )
        .bind(&stichtag_text)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let geloeschte_raeume = sqlx::query("DELETE FROM rooms WHERE expires_at < ?")
            .bind(&stichtag_text)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(AufraeumErgebnis {
            geloeschte_raeume,
            geloeschte_nachrichten,
        })
    }
}

pub(crate) fn row_to_raum(row: &sqlx::sqlite::SqliteRow) -> DbResult<RaumRecord> {
    let created_at = zeit_aus_text(&row.try_get::<String, _>("created_at")?)?;
    let updated_at: Option<String> = row.try_get("updated_at")?;
    let updated_at = updated_at.as_deref().map(zeit_aus_text).transpose()?;
    let expires_at = zeit_aus_text(&row.try_get::<String, _>("expires_at")?)?;

    Ok(RaumRecord {
        id: row.try_get("id")?,
        password_hash: row.try_get("password_hash")?,
        owner_public_key: row.try_get("owner_public_key")?,
        owner_fingerprint: row.try_get("owner_fingerprint")?,
        guest_public_key: row.try_get("guest_public_key")?,
        guest_fingerprint: row.try_get("guest_fingerprint")?,
        created_at,
        updated_at,
        expires_at,
    })
}
