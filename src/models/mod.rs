pub mod loaders;
pub mod question;
pub mod topic;

pub use loaders::{load_or_builtin, load_question_bank, parse_question_bank};
pub use question::{Language, LocalizedText, Question, QuestionBank, OPTION_COUNT};
pub use topic::{tone_profile, ToneProfile, TopicTag};
