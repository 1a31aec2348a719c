pub mod quiz_session;
pub mod quiz_state;

pub use quiz_session::{AnswerOutcome, QuizReport, QuizSession, ReviewItem, ScoreGrade};
pub use quiz_state::{Phase, QuizState};
