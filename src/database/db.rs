//! Database operations for the review engine
//!
//! Handles SQLite schema setup, deck and card content, and per-learner
//! scheduling progress.

use crate::models::{Card, CardId, CardScheduleState, Deck, DeckId, DeckSnapshot, SessionClock};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Result, params};

/// Opens (or creates) the database file and makes sure every table exists
pub fn init_database(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates tables for deck content and review progress
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            name TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_name TEXT NOT NULL,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            FOREIGN KEY (deck_name) REFERENCES decks(name) ON DELETE CASCADE,
            UNIQUE(deck_name, question)
        );

        CREATE TABLE IF NOT EXISTS review_sessions (
            learner_id TEXT NOT NULL,
            deck_id TEXT NOT NULL,
            clock INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (learner_id, deck_id)
        );

        CREATE TABLE IF NOT EXISTS review_progress (
            learner_id TEXT NOT NULL,
            deck_id TEXT NOT NULL,
            card_id TEXT NOT NULL,
            repetitions INTEGER NOT NULL DEFAULT 0,
            interval_units INTEGER NOT NULL DEFAULT 0,
            easiness_factor REAL NOT NULL DEFAULT 2.5,
            PRIMARY KEY (learner_id, deck_id, card_id)
        );",
    )
}

/// Creates a new, empty deck
pub fn new_deck(name: &str, conn: &Connection) -> Result<()> {
    conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
    tracing::info!(deck = name, "Deck created");
    Ok(())
}

/// Adds a card to a deck. A second card with the same question is ignored.
pub fn add_card(deck_name: &str, question: &str, answer: &str, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO cards (deck_name, question, answer) VALUES (?1, ?2, ?3)",
        params![deck_name, question, answer],
    )?;
    Ok(())
}

/// Stores a whole deck (content only) in one transaction
pub fn insert_deck(deck: &Deck, conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    new_deck(&deck.name, &tx)?;
    for card in deck.cards() {
        add_card(&deck.name, &card.question, &card.reference_answer, &tx)?;
    }
    tx.commit()
}

/// Retrieves the cards of a deck in the order they were added
pub fn get_cards_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt =
        conn.prepare("SELECT question, answer FROM cards WHERE deck_name = ?1 ORDER BY id")?;

    let cards = stmt
        .query_map(params![deck_name], |row| {
            Ok(Card {
                question: row.get(0)?,
                reference_answer: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<Card>>>()?;

    Ok(cards)
}

/// Retrieves all deck names
pub fn get_all_decks(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM decks ORDER BY name")?;
    let decks = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>>>()?;
    Ok(decks)
}

/// Loads every deck with fresh scheduling state.
///
/// Learner progress is applied separately when a review session starts.
pub fn load_all_decks(conn: &Connection) -> Result<Vec<Deck>> {
    get_all_decks(conn)?
        .into_iter()
        .map(|name| -> Result<Deck> {
            let cards = get_cards_for_deck(&name, conn)?;
            Ok(Deck::new(name, cards))
        })
        .collect()
}

/// Replaces the stored progress of a learner on a deck
pub fn save_snapshot(
    learner_id: &str,
    deck_id: &DeckId,
    snapshot: &DeckSnapshot,
    conn: &Connection,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO review_sessions (learner_id, deck_id, clock, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (learner_id, deck_id)
         DO UPDATE SET clock = excluded.clock, updated_at = excluded.updated_at",
        params![
            learner_id,
            deck_id.as_str(),
            snapshot.clock.value() as i64,
            snapshot.updated_at.timestamp()
        ],
    )?;

    tx.execute(
        "DELETE FROM review_progress WHERE learner_id = ?1 AND deck_id = ?2",
        params![learner_id, deck_id.as_str()],
    )?;

    {
        let mut insert = tx.prepare(
            "INSERT INTO review_progress
             (learner_id, deck_id, card_id, repetitions, interval_units, easiness_factor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (card_id, state) in &snapshot.states {
            insert.execute(params![
                learner_id,
                deck_id.as_str(),
                card_id.as_str(),
                state.repetitions,
                state.interval_units,
                state.easiness_factor
            ])?;
        }
    }

    tx.commit()
}

/// Loads the stored progress of a learner on a deck, if any
pub fn load_snapshot(
    learner_id: &str,
    deck_id: &DeckId,
    conn: &Connection,
) -> Result<Option<DeckSnapshot>> {
    let header = conn
        .query_row(
            "SELECT clock, updated_at FROM review_sessions WHERE learner_id = ?1 AND deck_id = ?2",
            params![learner_id, deck_id.as_str()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    let Some((clock, updated_at)) = header else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT card_id, repetitions, interval_units, easiness_factor
         FROM review_progress
         WHERE learner_id = ?1 AND deck_id = ?2
         ORDER BY card_id",
    )?;
    let states = stmt
        .query_map(params![learner_id, deck_id.as_str()], |row| {
            Ok((
                CardId::from(row.get::<_, String>(0)?),
                CardScheduleState {
                    repetitions: row.get(1)?,
                    interval_units: row.get(2)?,
                    easiness_factor: row.get(3)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(DeckSnapshot {
        clock: SessionClock::new(clock.max(0) as u64),
        states,
        updated_at: DateTime::from_timestamp(updated_at, 0).unwrap_or_default(),
    }))
}

/// Deletes the stored progress of a learner on a deck
pub fn remove_snapshot(learner_id: &str, deck_id: &DeckId, conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM review_progress WHERE learner_id = ?1 AND deck_id = ?2",
        params![learner_id, deck_id.as_str()],
    )?;
    tx.execute(
        "DELETE FROM review_sessions WHERE learner_id = ?1 AND deck_id = ?2",
        params![learner_id, deck_id.as_str()],
    )?;
    tx.commit()
}

/// Deletes progress that has not been touched for `days` days.
///
/// Returns the number of (learner, deck) pairs removed.
pub fn prune_snapshots_older_than(days: i64, conn: &Connection) -> Result<usize> {
    let cutoff = (Utc::now() - Duration::days(days)).timestamp();
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "DELETE FROM review_progress WHERE EXISTS (
             SELECT 1 FROM review_sessions s
             WHERE s.learner_id = review_progress.learner_id
               AND s.deck_id = review_progress.deck_id
               AND s.updated_at < ?1
         )",
        params![cutoff],
    )?;
    let removed = tx.execute(
        "DELETE FROM review_sessions WHERE updated_at < ?1",
        params![cutoff],
    )?;

    tx.commit()?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_snapshot(clock: u64, updated_at: DateTime<Utc>) -> DeckSnapshot {
        DeckSnapshot {
            clock: SessionClock::new(clock),
            states: vec![
                (
                    CardId::from("aaaa".to_string()),
                    CardScheduleState {
                        repetitions: 2,
                        interval_units: 6,
                        easiness_factor: 2.7,
                    },
                ),
                (
                    CardId::from("bbbb".to_string()),
                    CardScheduleState {
                        repetitions: 0,
                        interval_units: 1,
                        easiness_factor: 1.9,
                    },
                ),
            ],
            updated_at,
        }
    }

    #[test]
    fn test_deck_content_roundtrip() {
        let conn = memory_db();
        let deck = Deck::new(
            "Aardrijkskunde",
            vec![
                Card::new("Hoofdstad van Frankrijk?", "Parijs"),
                Card::new("Langste rivier van Nederland?", "De Rijn"),
            ],
        );

        insert_deck(&deck, &conn).unwrap();
        let decks = load_all_decks(&conn).unwrap();

        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name, "Aardrijkskunde");
        assert_eq!(decks[0].cards().cloned().collect::<Vec<_>>(), deck.cards().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn test_duplicate_question_ignored() {
        let conn = memory_db();
        new_deck("Deck", &conn).unwrap();
        add_card("Deck", "q", "a", &conn).unwrap();
        add_card("Deck", "q", "other", &conn).unwrap();

        let cards = get_cards_for_deck("Deck", &conn).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].reference_answer, "a");
    }

    #[test]
    fn test_duplicate_deck_rejected() {
        let conn = memory_db();
        new_deck("Deck", &conn).unwrap();
        assert!(new_deck("Deck", &conn).is_err());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let conn = memory_db();
        let deck_id = DeckId::from_title("Biologie");
        let now = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
        let snapshot = sample_snapshot(7, now);

        save_snapshot("anna", &deck_id, &snapshot, &conn).unwrap();
        let loaded = load_snapshot("anna", &deck_id, &conn).unwrap().unwrap();

        assert_eq!(loaded, snapshot);
        assert!(load_snapshot("bram", &deck_id, &conn).unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_states() {
        let conn = memory_db();
        let deck_id = DeckId::from_title("Biologie");
        save_snapshot("anna", &deck_id, &sample_snapshot(7, Utc::now()), &conn).unwrap();

        let smaller = DeckSnapshot {
            clock: SessionClock::new(8),
            states: vec![],
            updated_at: Utc::now(),
        };
        save_snapshot("anna", &deck_id, &smaller, &conn).unwrap();

        let loaded = load_snapshot("anna", &deck_id, &conn).unwrap().unwrap();
        assert_eq!(loaded.clock.value(), 8);
        assert!(loaded.states.is_empty());
    }

    #[test]
    fn test_remove_snapshot() {
        let conn = memory_db();
        let deck_id = DeckId::from_title("Biologie");
        save_snapshot("anna", &deck_id, &sample_snapshot(3, Utc::now()), &conn).unwrap();

        remove_snapshot("anna", &deck_id, &conn).unwrap();
        assert!(load_snapshot("anna", &deck_id, &conn).unwrap().is_none());
    }

    #[test]
    fn test_prune_removes_only_stale_progress() {
        let conn = memory_db();
        let stale = DeckId::from_title("Oud");
        let recent = DeckId::from_title("Nieuw");

        save_snapshot("anna", &stale, &sample_snapshot(1, Utc::now() - Duration::days(45)), &conn).unwrap();
        save_snapshot("anna", &recent, &sample_snapshot(1, Utc::now()), &conn).unwrap();

        let removed = prune_snapshots_older_than(30, &conn).unwrap();

        assert_eq!(removed, 1);
        assert!(load_snapshot("anna", &stale, &conn).unwrap().is_none());
        assert!(load_snapshot("anna", &recent, &conn).unwrap().is_some());

        let leftover: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM review_progress WHERE deck_id = ?1",
                params![stale.as_str()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(leftover, 0);
    }
}
