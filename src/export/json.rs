//! JSON import/export module for decks.
//! Only card content is written; learner progress lives in the database.

use crate::models::{Card, Deck};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const UNTITLED_DECK: &str = "Imported Deck";

#[derive(Serialize, Deserialize)]
struct DeckFile {
    name: String,
    #[serde(alias = "flashcards")]
    cards: Vec<Card>,
}

/// Either a named deck or the bare card array the content generator returns.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFormat {
    Named(DeckFile),
    Bare(Vec<Card>),
}

/// Exports a deck to a JSON file at the specified path.
pub fn export_json_to_path(deck: &Deck, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
    let file_contents = DeckFile {
        name: deck.name.clone(),
        cards: deck.cards().cloned().collect(),
    };
    let json_string = serde_json::to_string_pretty(&file_contents)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    tracing::info!(deck = %deck.name, path = %path.as_ref().display(), "Deck exported");
    Ok(())
}

/// Imports a deck from a JSON file.
///
/// A bare array of cards is named after the file stem.
pub fn import_json(path: impl AsRef<Path>) -> Result<Deck, Box<dyn std::error::Error>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck = match serde_json::from_str::<ImportFormat>(&contents)? {
        ImportFormat::Named(file) => Deck::new(file.name, file.cards),
        ImportFormat::Bare(cards) => {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|stem| !stem.trim().is_empty())
                .unwrap_or(UNTITLED_DECK);
            Deck::new(name, cards)
        }
    };

    if deck.name.trim().is_empty() {
        return Err("deck name must not be empty".into());
    }

    tracing::info!(deck = %deck.name, cards = deck.len(), path = %path.display(), "Deck imported");
    Ok(deck)
}
