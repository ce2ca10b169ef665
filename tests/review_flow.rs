use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use review_engine::database::db::{init_database, insert_deck, load_all_decks};
use review_engine::database::{DeckStore, SqliteStore};
use review_engine::export::json::import_json;
use review_engine::judge::{AnswerJudge, JudgeError, JudgeRequest, Verdict, VerdictSource};
use review_engine::models::{Card, Deck, Grade, ReviewSession, SessionPhase};

/// Replays a fixed list of judge outcomes, one per answer.
struct ScriptedJudge {
    outcomes: Mutex<VecDeque<Result<bool, ()>>>,
    seen: Mutex<Vec<JudgeRequest>>,
}

impl ScriptedJudge {
    fn new(outcomes: Vec<Result<bool, ()>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl AnswerJudge for ScriptedJudge {
    fn judge(&self, request: &JudgeRequest) -> Result<Verdict, JudgeError> {
        self.seen.lock().unwrap().push(request.clone());
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Ok(is_correct)) => Ok(Verdict {
                is_correct,
                feedback: if is_correct { "Precies!" } else { "Bijna." }.to_string(),
                source: VerdictSource::Judge,
            }),
            Some(Err(())) | None => Err(JudgeError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
        }
    }
}

fn biology_deck() -> Deck {
    Deck::new(
        "Biologie H2",
        vec![
            Card::new("Wat is de functie van mitochondriën?", "Energie (ATP) produceren"),
            Card::new("Waar vindt eiwitsynthese plaats?", "Ribosomen"),
            Card::new("Wat bevat de celkern?", "DNA"),
        ],
    )
}

fn open_store(dir: &tempfile::TempDir) -> SqliteStore {
    let path = dir.path().join("review.sqlite3");
    let conn = init_database(path.to_str().unwrap()).unwrap();
    SqliteStore::new(Arc::new(Mutex::new(conn)))
}

/// Answers the current card, follows the judge's suggestion and returns the question.
fn answer_and_grade(session: &mut ReviewSession, answer: &str, judge: &dyn AnswerJudge) -> String {
    let question = session.current_card().unwrap().question.clone();
    session.answer_with(answer, judge).unwrap();
    let grade = session.suggested_grade().unwrap();
    session.grade_with(grade).unwrap();
    question
}

#[test]
fn test_full_session_with_failures_and_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let judge = ScriptedJudge::new(vec![Ok(false), Ok(true), Err(()), Ok(true)]);
    let mut session = ReviewSession::resume(biology_deck(), "anna", Box::new(store.clone()));

    let mut order = Vec::new();
    // 1st: mitochondria judged wrong -> Fail, due again at clock 1
    session.advance().unwrap();
    order.push(answer_and_grade(&mut session, "iets met energie", &judge));
    // 2nd: mitochondria again, judged right
    session.advance().unwrap();
    order.push(answer_and_grade(&mut session, "ATP maken", &judge));
    // 3rd: judge fails, local comparison accepts the exact answer
    session.advance().unwrap();
    let verdict = session.answer_with(" ribosomen ", &judge).unwrap();
    assert_eq!(verdict.source, VerdictSource::Fallback);
    assert!(verdict.is_correct);
    order.push(session.current_card().unwrap().question.clone());
    session.grade_with(Grade::Hard).unwrap();
    // 4th: last fresh card
    session.advance().unwrap();
    order.push(answer_and_grade(&mut session, "DNA", &judge));

    assert_eq!(session.advance().unwrap(), None);
    assert_eq!(session.phase(), &SessionPhase::Complete);
    assert_eq!(
        order,
        vec![
            "Wat is de functie van mitochondriën?",
            "Wat is de functie van mitochondriën?",
            "Waar vindt eiwitsynthese plaats?",
            "Wat bevat de celkern?",
        ]
    );
    assert_eq!(judge.seen.lock().unwrap().len(), 4);

    let saved = store.load("anna", &session.deck().id).unwrap().unwrap();
    assert_eq!(saved.clock.value(), 4);
    assert!(saved.states.iter().all(|(_, state)| state.repetitions == 1));

    // mitochondria: fail (EF 2.5 -> 1.7), then easy (1.7 -> 1.8)
    let mito = &session.deck().entries[0].state;
    assert!((mito.easiness_factor - 1.8).abs() < 1e-9);
    assert_eq!(mito.interval_units, 1);
}

#[test]
fn test_progress_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = open_store(&dir);
        {
            let conn = store.connection();
            let conn = conn.lock().unwrap();
            insert_deck(&biology_deck(), &conn).unwrap();
        }
        let deck = {
            let conn = store.connection();
            let conn = conn.lock().unwrap();
            load_all_decks(&conn).unwrap().remove(0)
        };
        let judge = ScriptedJudge::new(vec![Ok(true)]);
        let mut session = ReviewSession::resume(deck, "anna", Box::new(store));
        session.advance().unwrap();
        answer_and_grade(&mut session, "ATP", &judge);
    }

    let store = open_store(&dir);
    let deck = {
        let conn = store.connection();
        let conn = conn.lock().unwrap();
        load_all_decks(&conn).unwrap().remove(0)
    };
    let mut session = ReviewSession::resume(deck, "anna", Box::new(store.clone()));

    assert_eq!(session.clock().value(), 1);
    assert_eq!(session.learned_count(), 1);
    let next = session.advance().unwrap().unwrap();
    assert_eq!(next.question, "Waar vindt eiwitsynthese plaats?");

    // another learner starts from scratch on the same deck
    let other = ReviewSession::resume(biology_deck(), "bram", Box::new(store));
    assert_eq!(other.learned_count(), 0);
    assert_eq!(other.clock().value(), 0);
}

#[test]
fn test_imported_repeats_do_not_block_saving() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Scheikunde.json");
    std::fs::write(
        &file,
        r#"[
  { "question": "Symbool van natrium?", "answer": "Na" },
  { "question": "Symbool van natrium?", "answer": "Na" },
  { "question": "Symbool van kalium?", "answer": "K" }
]"#,
    )
    .unwrap();

    let deck = import_json(&file).unwrap();
    assert_eq!(deck.len(), 2);

    let store = open_store(&dir);
    {
        let conn = store.connection();
        let conn = conn.lock().unwrap();
        insert_deck(&deck, &conn).unwrap();
    }

    let mut session = ReviewSession::resume(deck, "anna", Box::new(store.clone()));
    session.advance().unwrap();
    answer_and_grade(&mut session, "Na", &ScriptedJudge::new(vec![Ok(true)]));

    let saved = store.load("anna", &session.deck().id).unwrap().unwrap();
    assert_eq!(saved.clock.value(), 1);
    assert_eq!(saved.states.len(), 2);
}

#[test]
fn test_similar_titles_keep_separate_progress() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let judge = ScriptedJudge::new(vec![Ok(true), Ok(false)]);
    let wiskunde = |title: &str| Deck::new(title, vec![Card::new("Wat is 7 x 8?", "56")]);

    let mut first = ReviewSession::resume(wiskunde("Wiskunde"), "anna", Box::new(store.clone()));
    first.advance().unwrap();
    answer_and_grade(&mut first, "56", &judge);

    let mut second = ReviewSession::resume(wiskunde("wiskunde!"), "anna", Box::new(store.clone()));
    assert_eq!(second.clock().value(), 0);
    second.advance().unwrap();
    answer_and_grade(&mut second, "54", &judge);

    let resumed = ReviewSession::resume(wiskunde("Wiskunde"), "anna", Box::new(store));
    assert_eq!(resumed.learned_count(), 1);
    assert_eq!(resumed.clock().value(), 1);
}
