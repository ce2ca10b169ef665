//! Durable storage for a learner's progress on a deck.
use super::db;
use crate::models::{DeckId, DeckSnapshot};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Progress older than this many days is dropped by [`SqliteStore::prune_stale`].
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
}

pub trait DeckStore {
    fn save(&self, learner_id: &str, deck_id: &DeckId, snapshot: &DeckSnapshot)
    -> Result<(), StoreError>;

    fn load(&self, learner_id: &str, deck_id: &DeckId) -> Result<Option<DeckSnapshot>, StoreError>;

    fn remove(&self, learner_id: &str, deck_id: &DeckId) -> Result<(), StoreError>;
}

/// [`DeckStore`] backed by the application's SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        db::init_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    pub fn prune_stale(&self, days: i64) -> Result<usize, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let removed = db::prune_snapshots_older_than(days, &conn)?;
        if removed > 0 {
            tracing::info!(removed, days, "Pruned stale review progress");
        }
        Ok(removed)
    }
}

impl DeckStore for SqliteStore {
    fn save(
        &self,
        learner_id: &str,
        deck_id: &DeckId,
        snapshot: &DeckSnapshot,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        db::save_snapshot(learner_id, deck_id, snapshot, &conn)?;
        Ok(())
    }

    fn load(&self, learner_id: &str, deck_id: &DeckId) -> Result<Option<DeckSnapshot>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(db::load_snapshot(learner_id, deck_id, &conn)?)
    }

    fn remove(&self, learner_id: &str, deck_id: &DeckId) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        db::remove_snapshot(learner_id, deck_id, &conn)?;
        Ok(())
    }
}
