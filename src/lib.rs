pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod judge;
pub mod logging;
pub mod models;

pub use error::ReviewError;
pub use models::{Card, CardScheduleState, Deck, Grade, Quality, ReviewSession, SessionClock};
