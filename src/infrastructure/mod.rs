pub mod cue_player;

pub use cue_player::{CueError, CueKind, CuePlayer, FeedbackRequest, LogCuePlayer};
