use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{HistoryRecord, NewHistoryRecord};

use super::schema::{MIGRATIONS, SCHEMA_VERSION};

/// Classification history backed by a single SQLite file.
///
/// All statements run on the `tokio-rusqlite` connection thread, which also
/// serializes concurrent writers. Cloning is cheap and shares the connection.
#[derive(Clone)]
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let version = conn
            .call(|conn| {
                let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
                Ok(version)
            })
            .await?;

        if version > SCHEMA_VERSION {
            return Err(AppError::Storage(format!(
                "database schema version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            )));
        }

        let Ok(start) = usize::try_from(version) else {
            return Err(AppError::Storage(format!(
                "database schema version {} is invalid",
                version
            )));
        };

        if version < SCHEMA_VERSION {
            tracing::info!("Migrating history database from v{} to v{}", version, SCHEMA_VERSION);
            conn.call(move |conn| {
                let tx = conn.transaction()?;
                for step in &MIGRATIONS[start..] {
                    tx.execute_batch(step)?;
                }
                tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        }

        Ok(Self { conn })
    }

    pub async fn insert(&self, record: NewHistoryRecord) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO history (image_location, result_label) VALUES (?1, ?2)",
                    params![record.image_location, record.result_label],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        tracing::debug!("Saved history record {}", id);
        Ok(id)
    }

    pub async fn list_all(&self) -> Result<Vec<HistoryRecord>> {
        let records = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, image_location, result_label FROM history ORDER BY id",
                )?;
                let records = stmt
                    .query_map([], record_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    pub async fn get(&self, id: i64) -> Result<Option<HistoryRecord>> {
        let record = self
            .conn
            .call(move |conn| {
                let record = conn
                    .query_row(
                        "SELECT id, image_location, result_label FROM history WHERE id = ?1",
                        params![id],
                        record_from_row,
                    )
                    .optional()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    pub async fn count(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count as usize)
    }

    /// Deleting an id that is not stored is an error, not a no-op.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .call(move |conn| {
                let affected = conn.execute("DELETE FROM history WHERE id = ?1", params![id])?;
                Ok(affected)
            })
            .await?;

        if affected == 0 {
            return Err(AppError::NotFound(id));
        }
        Ok(())
    }
}

fn record_from_row(row: &Row) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get(0)?,
        image_location: row.get(1)?,
        result_label: row.get(2)?,
    })
}
