//! Answer judging: decides whether a learner's free-text answer matches the card.
//!
//! The remote judge may fail in any number of ways; callers recover with
//! [`fallback_verdict`], which compares the answers locally.

mod gemini;

pub use gemini::GeminiJudge;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Grade;

pub const FALLBACK_FEEDBACK_CORRECT: &str =
    "Je antwoord komt overeen met het juiste antwoord. (Automatische controle)";
pub const FALLBACK_FEEDBACK_INCORRECT: &str =
    "De beoordeling is niet beschikbaar. Vergelijk je antwoord zelf met het juiste antwoord.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgeRequest {
    pub question: String,
    pub reference_answer: String,
    pub learner_answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictSource {
    Judge,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
    pub feedback: String,
    pub source: VerdictSource,
}

impl Verdict {
    /// Grade offered as the default choice on the quiz screen.
    pub fn suggested_grade(&self) -> Grade {
        if self.is_correct { Grade::Easy } else { Grade::Fail }
    }
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("answer judge is disabled")]
    Disabled,
    #[error("answer judge timed out")]
    Timeout,
    #[error("answer judge network error: {0}")]
    Network(String),
    #[error("answer judge api error: status={status}, message={message}")]
    Api { status: u16, message: String },
    #[error("malformed judge reply: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JudgeError::Timeout
        } else {
            JudgeError::Network(err.to_string())
        }
    }
}

pub trait AnswerJudge: Send + Sync {
    fn judge(&self, request: &JudgeRequest) -> Result<Verdict, JudgeError>;
}

/// Local judge: trimmed, case-insensitive equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatchJudge;

impl AnswerJudge for ExactMatchJudge {
    fn judge(&self, request: &JudgeRequest) -> Result<Verdict, JudgeError> {
        Ok(fallback_verdict(request))
    }
}

pub fn answers_match(reference_answer: &str, learner_answer: &str) -> bool {
    reference_answer.trim().to_lowercase() == learner_answer.trim().to_lowercase()
}

pub fn fallback_verdict(request: &JudgeRequest) -> Verdict {
    let is_correct = answers_match(&request.reference_answer, &request.learner_answer);
    Verdict {
        is_correct,
        feedback: if is_correct {
            FALLBACK_FEEDBACK_CORRECT
        } else {
            FALLBACK_FEEDBACK_INCORRECT
        }
        .to_string(),
        source: VerdictSource::Fallback,
    }
}
