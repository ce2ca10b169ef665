pub mod card;
pub mod deck;
pub mod grade;
pub mod review_session;
pub mod schedule_state;
pub mod selector;
pub mod session_clock;
pub mod sm2;

pub use card::{Card, CardId};
pub use deck::{Deck, DeckEntry, DeckId, DeckSnapshot};
pub use grade::{Grade, PASSING_QUALITY, Quality};
pub use review_session::{ReviewSession, SessionPhase};
pub use schedule_state::{CardScheduleState, INITIAL_EASINESS_FACTOR, MIN_EASINESS_FACTOR};
pub use session_clock::SessionClock;
