//! Review session controller for the quiz ("Overhoren") mode.
//!
//! Drives one learner through a deck: select a card, collect a free-text
//! answer, have it judged, collect a grade, reschedule the card with SM-2,
//! persist, and select again until nothing is due.

use super::selector::{pending_count, select_next};
use super::{Card, CardScheduleState, Deck, Grade, Quality, SessionClock, sm2};
use crate::database::DeckStore;
use crate::error::ReviewError;
use crate::judge::{AnswerJudge, JudgeError, JudgeRequest, Verdict, fallback_verdict};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    AwaitingSelection,
    Presenting {
        index: usize,
    },
    JudgePending {
        index: usize,
        answer: String,
    },
    AwaitingGrade {
        index: usize,
        answer: String,
        verdict: Verdict,
    },
    Complete,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::AwaitingSelection => "awaiting selection",
            SessionPhase::Presenting { .. } => "presenting a card",
            SessionPhase::JudgePending { .. } => "waiting for the judge",
            SessionPhase::AwaitingGrade { .. } => "awaiting a grade",
            SessionPhase::Complete => "complete",
        }
    }

    fn card_index(&self) -> Option<usize> {
        match self {
            SessionPhase::Presenting { index }
            | SessionPhase::JudgePending { index, .. }
            | SessionPhase::AwaitingGrade { index, .. } => Some(*index),
            SessionPhase::AwaitingSelection | SessionPhase::Complete => None,
        }
    }
}

pub struct ReviewSession {
    deck: Deck,
    clock: SessionClock,
    phase: SessionPhase,
    learner_id: String,
    store: Option<Box<dyn DeckStore>>,
}

impl ReviewSession {
    /// Starts an in-memory session; nothing is persisted.
    pub fn new(deck: Deck, learner_id: impl Into<String>) -> Self {
        Self {
            deck,
            clock: SessionClock::default(),
            phase: SessionPhase::AwaitingSelection,
            learner_id: learner_id.into(),
            store: None,
        }
    }

    /// Starts a session that restores and saves progress through `store`.
    ///
    /// A failed load is logged and the deck starts from its current state.
    pub fn resume(deck: Deck, learner_id: impl Into<String>, store: Box<dyn DeckStore>) -> Self {
        let mut session = Self::new(deck, learner_id);

        match store.load(&session.learner_id, &session.deck.id) {
            Ok(Some(snapshot)) => {
                session.clock = session.deck.restore(&snapshot);
                tracing::info!(
                    learner = %session.learner_id,
                    deck = %session.deck.id,
                    clock = session.clock.value(),
                    "Resumed review progress"
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    learner = %session.learner_id,
                    deck = %session.deck.id,
                    "Failed to load review progress, starting fresh"
                );
            }
        }

        session.store = Some(store);
        session
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn clock(&self) -> SessionClock {
        self.clock
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.phase
            .card_index()
            .and_then(|index| self.deck.get(index))
            .map(|entry| &entry.card)
    }

    /// Picks the next card. Returns `None` once the session is complete.
    pub fn advance(&mut self) -> Result<Option<&Card>, ReviewError> {
        match self.phase {
            SessionPhase::AwaitingSelection => {}
            SessionPhase::Complete => return Ok(None),
            _ => return Err(self.invalid("select a card")),
        }

        match select_next(&self.deck, self.clock) {
            Some(index) => {
                self.phase = SessionPhase::Presenting { index };
                Ok(self.deck.get(index).map(|entry| &entry.card))
            }
            None => {
                tracing::info!(
                    learner = %self.learner_id,
                    deck = %self.deck.id,
                    learned = self.learned_count(),
                    "Review session complete"
                );
                self.phase = SessionPhase::Complete;
                Ok(None)
            }
        }
    }

    /// Records the learner's answer and hands back what the judge needs.
    pub fn submit_answer(&mut self, answer: impl Into<String>) -> Result<JudgeRequest, ReviewError> {
        let SessionPhase::Presenting { index } = self.phase else {
            return Err(self.invalid("submit an answer"));
        };

        let answer = answer.into();
        let request = self.judge_request(index, &answer);
        self.phase = SessionPhase::JudgePending { index, answer };
        Ok(request)
    }

    /// Accepts the judge's outcome. Judge errors fall back to local comparison.
    pub fn resolve_judgement(
        &mut self,
        outcome: Result<Verdict, JudgeError>,
    ) -> Result<Verdict, ReviewError> {
        let SessionPhase::JudgePending { index, answer } = &self.phase else {
            return Err(self.invalid("accept a judgement"));
        };
        let (index, answer) = (*index, answer.clone());

        let verdict = match outcome {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "Answer judge unavailable, comparing locally");
                fallback_verdict(&self.judge_request(index, &answer))
            }
        };

        self.phase = SessionPhase::AwaitingGrade {
            index,
            answer,
            verdict: verdict.clone(),
        };
        Ok(verdict)
    }

    /// Submits and judges in one blocking step.
    pub fn answer_with(
        &mut self,
        answer: impl Into<String>,
        judge: &dyn AnswerJudge,
    ) -> Result<Verdict, ReviewError> {
        let request = self.submit_answer(answer)?;
        let outcome = judge.judge(&request);
        self.resolve_judgement(outcome)
    }

    /// Grades the current card on the 0-5 scale.
    pub fn grade(&mut self, value: u8) -> Result<CardScheduleState, ReviewError> {
        if !matches!(self.phase, SessionPhase::AwaitingGrade { .. }) {
            return Err(self.invalid("grade"));
        }
        let quality = Quality::new(value)?;
        self.apply(quality)
    }

    pub fn grade_with(&mut self, grade: Grade) -> Result<CardScheduleState, ReviewError> {
        self.apply(grade.quality())
    }

    fn apply(&mut self, quality: Quality) -> Result<CardScheduleState, ReviewError> {
        let SessionPhase::AwaitingGrade { index, .. } = self.phase else {
            return Err(self.invalid("grade"));
        };

        let entry = &mut self.deck.entries[index];
        let next = sm2::next_state(&entry.state, quality);
        tracing::debug!(
            card = %entry.id,
            quality = quality.value(),
            repetitions = next.repetitions,
            interval = next.interval_units,
            easiness = next.easiness_factor,
            "Card rescheduled"
        );
        entry.state = next;

        self.clock.tick();
        self.persist();
        self.phase = SessionPhase::AwaitingSelection;
        Ok(next)
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.phase {
            SessionPhase::AwaitingGrade { verdict, .. } => Some(verdict),
            _ => None,
        }
    }

    pub fn suggested_grade(&self) -> Option<Grade> {
        self.verdict().map(Verdict::suggested_grade)
    }

    /// The learner's answer to the current card, once submitted.
    pub fn submitted_answer(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::JudgePending { answer, .. } | SessionPhase::AwaitingGrade { answer, .. } => {
                Some(answer.as_str())
            }
            _ => None,
        }
    }

    pub fn is_judge_pending(&self) -> bool {
        matches!(self.phase, SessionPhase::JudgePending { .. })
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    pub fn learned_count(&self) -> usize {
        self.deck
            .entries
            .iter()
            .filter(|entry| entry.state.is_learned())
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.deck.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// Cards the selector could hand out right now.
    pub fn due_count(&self) -> usize {
        pending_count(&self.deck, self.clock)
    }

    pub fn phase_message(&self) -> String {
        format!(
            "Turn {}: {} / {} learned ({} remaining)",
            self.clock.value() + 1,
            self.learned_count(),
            self.total_count(),
            self.remaining_count()
        )
    }

    /// Hands the deck back, e.g. to show final statistics.
    pub fn into_deck(self) -> Deck {
        self.deck
    }

    fn judge_request(&self, index: usize, answer: &str) -> JudgeRequest {
        let card = &self.deck.entries[index].card;
        JudgeRequest {
            question: card.question.clone(),
            reference_answer: card.reference_answer.clone(),
            learner_answer: answer.to_string(),
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = self.deck.snapshot(self.clock);
        if let Err(e) = store.save(&self.learner_id, &self.deck.id, &snapshot) {
            tracing::warn!(
                error = %e,
                learner = %self.learner_id,
                deck = %self.deck.id,
                "Failed to save review progress"
            );
        }
    }

    fn invalid(&self, action: &'static str) -> ReviewError {
        ReviewError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}
