// Entity selection for pairwise comparison: a per-poll suggestion pool, a
// per-slot cursor history, and the orchestration that combines them with a
// host-supplied candidate source.

pub mod history;
pub mod poll;
pub mod pool;
pub mod selection;
pub mod session;
pub mod source;

pub use history::{CursorHistory, Direction};
pub use poll::{PollKey, Uid};
pub use pool::SuggestionPool;
pub use selection::{browse_or_suggest, suggest, Selection};
pub use session::{ComparisonSession, Slot};
pub use source::CandidateSource;
