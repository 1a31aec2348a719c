pub mod feedback;

pub use feedback::{CueTicket, CueTiming, FeedbackSequencer, SequenceHandle};
