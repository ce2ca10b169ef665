pub mod db;
pub mod store;

pub use store::{DEFAULT_RETENTION_DAYS, DeckStore, SqliteStore, StoreError};
