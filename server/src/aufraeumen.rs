//! Aufraeum-Job fuer abgelaufene Raeume
//!
//! Loescht periodisch Raeume deren Ablaufzeit ueberschritten ist, samt
//! der zugehoerigen Nachrichten. Der erste Lauf passiert direkt beim
//! Start.

use std::time::Duration;

use stillepost_db::{RaumRepository, SqliteDb};

/// Startet den Aufraeum-Job als eigenen Task
pub fn job_starten(db: SqliteDb, intervall: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(intervall);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match db.abgelaufene_loeschen(chrono::Utc::now()).await {
                Ok(ergebnis) if ergebnis.geloeschte_raeume > 0 => {
                    tracing::info!(
                        raeume = ergebnis.geloeschte_raeume,
                        nachrichten = ergebnis.geloeschte_nachrichten,
                        "Abgelaufene Raeume entfernt"
                    );
                }
                Ok(_) => {
                    tracing::debug!("Keine abgelaufenen Raeume");
                }
                Err(e) => {
                    tracing::error!(fehler = %e, "Aufraeumlauf fehlgeschlagen");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use stillepost_db::models::NeuerRaum;

    #[tokio::test]
    async fn job_raeumt_beim_start_auf() {
        let db = SqliteDb::in_memory().await.unwrap();
        RaumRepository::erstellen(
            &db,
            NeuerRaum {
                id: "alt1234567",
                password_hash: None,
                owner_public_key: "key",
                owner_fingerprint: "fp",
                expires_at: Utc::now() - ChronoDuration::hours(1),
            },
        )
        .await
        .unwrap();

        let job = job_starten(db.clone(), Duration::from_secs(3600));

        // Der erste Tick feuert sofort; kurz darauf muss der Raum weg sein
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if db.laden("alt1234567").await.unwrap().is_none() {
                job.abort();
                return;
            }
        }
        job.abort();
        panic!("Aufraeum-Job hat den abgelaufenen Raum nicht entfernt");
    }
}
