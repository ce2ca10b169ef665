mod app;
use review_engine::*;

use app::ReviewApp;
use config::Config;
use database::db::{get_all_decks, init_database, insert_deck, load_all_decks};
use database::{DEFAULT_RETENTION_DAYS, SqliteStore};
use judge::{AnswerJudge, ExactMatchJudge, GeminiJudge};
use std::sync::{Arc, Mutex};

fn sample_deck() -> Deck {
    Deck::new(
        "Hoofdsteden van Europa",
        vec![
            Card::new("Wat is de hoofdstad van Frankrijk?", "Parijs"),
            Card::new("Wat is de hoofdstad van Duitsland?", "Berlijn"),
            Card::new("Wat is de hoofdstad van Polen?", "Warschau"),
        ],
    )
}

fn main() -> eframe::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    logging::init_tracing(&config.log);
    tracing::debug!(?config, "Configuration loaded");

    let conn = init_database(&config.db_path).expect("Failed to initialize database");

    if get_all_decks(&conn).unwrap_or_default().is_empty() {
        match insert_deck(&sample_deck(), &conn) {
            Ok(()) => tracing::info!("Sample data created"),
            Err(e) => tracing::warn!(error = %e, "Failed to create sample data"),
        }
    }

    let decks = load_all_decks(&conn).expect("Failed to load decks from database");
    tracing::info!(count = decks.len(), "Loaded decks from database");
    for deck in &decks {
        tracing::info!(deck = %deck.name, cards = deck.len(), "Deck available");
    }

    let store = SqliteStore::new(Arc::new(Mutex::new(conn)));
    if let Err(e) = store.prune_stale(DEFAULT_RETENTION_DAYS) {
        tracing::warn!(error = %e, "Failed to prune stale progress");
    }

    let judge: Arc<dyn AnswerJudge> = if config.judge.is_enabled() {
        tracing::info!(model = %config.judge.model, "Answers are judged remotely");
        Arc::new(GeminiJudge::new(&config.judge))
    } else {
        tracing::info!("GEMINI_API_KEY not set, answers are compared locally");
        Arc::new(ExactMatchJudge)
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    let learner_id = config.learner_id.clone();
    eframe::run_native(
        "Overhoren",
        options,
        Box::new(move |_cc| Ok(Box::new(ReviewApp::new(decks, store, judge, learner_id)))),
    )
}
