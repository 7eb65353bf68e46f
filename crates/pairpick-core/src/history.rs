// Cursor history: a poll-scoped, bidirectional log of identifiers a slot has
// displayed, with a movable cursor.
//
// Each comparison slot owns its own `CursorHistory`, so browsing back in slot
// A never disturbs the position in slot B. The host must `clear()` every
// history at logout.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::poll::{PollKey, Uid};

/// Which end of a history (or which way to move the cursor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Browsing position within one poll's sequence.
///
/// A cursor materializes at the last index the first time it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Cursor {
    #[default]
    Uninitialized,
    At(usize),
}

#[derive(Debug, Default)]
struct Track {
    uids: VecDeque<Uid>,
    cursor: Cursor,
}

impl Track {
    /// Effective cursor index, `None` only when the sequence is empty.
    fn position(&self) -> Option<usize> {
        let last = self.uids.len().checked_sub(1)?;
        match self.cursor {
            Cursor::Uninitialized => Some(last),
            Cursor::At(idx) => Some(idx.min(last)),
        }
    }

    /// Index one step away from the cursor, if it exists.
    fn neighbour(&self, direction: Direction) -> Option<usize> {
        let pos = self.position()?;
        match direction {
            Direction::Left => pos.checked_sub(1),
            Direction::Right => (pos + 1 < self.uids.len()).then_some(pos + 1),
        }
    }

    /// The one transition every move goes through: resolve the cursor, then
    /// shift it by one unless it sits on the boundary.
    fn step(&mut self, direction: Direction) -> Option<Uid> {
        let pos = self.position()?;
        self.cursor = Cursor::At(pos);

        let next = self.neighbour(direction)?;
        self.cursor = Cursor::At(next);
        self.uids.get(next).cloned()
    }

    fn append(&mut self, uid: Uid, end: Direction) {
        match end {
            Direction::Left => {
                self.uids.push_front(uid);
                self.cursor = Cursor::At(0);
            }
            Direction::Right => {
                self.uids.push_back(uid);
                self.cursor = Cursor::At(self.uids.len() - 1);
            }
        }
    }

    fn insert(&mut self, uid: Uid, side: Direction) {
        let Some(pos) = self.position() else {
            self.uids.push_back(uid);
            self.cursor = Cursor::At(0);
            return;
        };

        if self.uids[pos] == uid {
            self.cursor = Cursor::At(pos);
            return;
        }

        let at = match side {
            Direction::Left => pos,
            Direction::Right => pos + 1,
        };
        self.uids.insert(at, uid);
        self.cursor = Cursor::At(at);
    }
}

/// Navigation log of one slot, partitioned by poll.
#[derive(Debug, Default)]
pub struct CursorHistory {
    tracks: HashMap<PollKey, Track>,
}

impl CursorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self, poll: &PollKey) -> bool {
        self.tracks.get(poll).map_or(true, |t| t.uids.is_empty())
    }

    pub fn len(&self, poll: &PollKey) -> usize {
        self.tracks.get(poll).map_or(0, |t| t.uids.len())
    }

    /// Identifier under the cursor. An unread cursor reads as the last item.
    pub fn current(&self, poll: &PollKey) -> Option<&Uid> {
        let track = self.tracks.get(poll)?;
        track.position().and_then(|pos| track.uids.get(pos))
    }

    /// Push `uid` at the front and put the cursor on it (index 0).
    pub fn append_left(&mut self, poll: &PollKey, uid: Uid) {
        self.append(poll, uid, Direction::Left);
    }

    /// Push `uid` at the back and put the cursor on it.
    pub fn append_right(&mut self, poll: &PollKey, uid: Uid) {
        self.append(poll, uid, Direction::Right);
    }

    /// Append at the given end of the history.
    pub fn append(&mut self, poll: &PollKey, uid: Uid, end: Direction) {
        debug!("History append {:?} in poll {}: {}", end, poll, uid);
        self.tracks.entry(poll.clone()).or_default().append(uid, end);
    }

    /// Insert `uid` right next to the cursor on `side` and move onto it.
    ///
    /// Re-inserting the identifier already under the cursor is a no-op.
    pub fn insert(&mut self, poll: &PollKey, uid: Uid, side: Direction) {
        self.tracks.entry(poll.clone()).or_default().insert(uid, side);
    }

    pub fn move_left(&mut self, poll: &PollKey) -> Option<Uid> {
        self.step(poll, Direction::Left)
    }

    pub fn move_right(&mut self, poll: &PollKey) -> Option<Uid> {
        self.step(poll, Direction::Right)
    }

    /// Move the cursor one step and return the identifier found there.
    ///
    /// Returns `None` on an empty history or when the cursor already sits on
    /// the boundary in that direction; the cursor then stays where it is.
    pub fn step(&mut self, poll: &PollKey, direction: Direction) -> Option<Uid> {
        self.tracks.get_mut(poll)?.step(direction)
    }

    pub fn has_next_left(&self, poll: &PollKey) -> bool {
        self.has_next(poll, Direction::Left)
    }

    pub fn has_next_right(&self, poll: &PollKey) -> bool {
        self.has_next(poll, Direction::Right)
    }

    /// Whether `step(poll, direction)` would return an identifier.
    pub fn has_next(&self, poll: &PollKey, direction: Direction) -> bool {
        self.tracks
            .get(poll)
            .is_some_and(|t| t.neighbour(direction).is_some())
    }

    /// Forget every poll's sequence and cursor. Call at logout.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
