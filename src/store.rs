use crate::errors::Result;
use crate::state::{AppState, SNAPSHOT_KEY};
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// SQLite-backed durable storage: the whole application state as one
/// JSON payload under a single versioned key, rewritten atomically after
/// every mutating operation.
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        info!("snapshot store ready");
        Ok(Self { conn })
    }

    /// Load the stored state, if any. An unreadable payload is reported
    /// and treated as absent; the app then starts from defaults.
    pub fn load(&self) -> Result<Option<AppState>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE key = ?1",
                params![SNAPSHOT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(state) => Ok(Some(state)),
                Err(e) => {
                    warn!(error = %e, "stored snapshot unreadable, starting from defaults");
                    Ok(None)
                }
            },
        }
    }

    /// Replace the stored snapshot with the current full state.
    pub fn save(&self, state: &AppState) -> Result<()> {
        let payload = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT INTO snapshots (key, payload, saved_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                saved_at = CURRENT_TIMESTAMP",
            params![SNAPSHOT_KEY, payload],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_sqlite() {
        let store = SnapshotStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_none());

        let mut state = AppState::default();
        state.settings.notes = "teslimat 2 hafta".into();
        state.settings.set_vat_rate(18.0);
        store.save(&state).unwrap();

        let loaded = store.load().unwrap().expect("snapshot should exist");
        assert_eq!(loaded.settings.notes, "teslimat 2 hafta");
        assert_eq!(loaded.settings.vat_rate, 18.0);
    }

    #[test]
    fn corrupt_payload_degrades_to_absent() {
        let store = SnapshotStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO snapshots (key, payload) VALUES (?1, ?2)",
                params![SNAPSHOT_KEY, "{not json"],
            )
            .unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_overwrites_the_single_key() {
        let store = SnapshotStore::open_in_memory().unwrap();
        store.save(&AppState::default()).unwrap();
        store.save(&AppState::default()).unwrap();
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
