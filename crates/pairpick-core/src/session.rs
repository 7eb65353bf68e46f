// Comparison session: the per-user wiring of one suggestion pool, one cursor
// history per slot and the candidate source.
//
// The host builds one session per logged-in user and calls `logout()` when the
// user leaves, so no browsing history or pool content leaks into the next
// session sharing the process.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, info};

use crate::history::{CursorHistory, Direction};
use crate::poll::{PollKey, Uid};
use crate::pool::SuggestionPool;
use crate::selection::{browse_or_suggest, Selection};
use crate::source::CandidateSource;

/// One of the two positions of a pairwise comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Default)]
struct SlotState {
    history: CursorHistory,
    shown: HashMap<PollKey, Uid>,
}

/// Unordered pair of compared identifiers, stored smallest first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ComparedPair(Uid, Uid);

impl ComparedPair {
    fn new(a: &Uid, b: &Uid) -> Self {
        if a <= b {
            ComparedPair(a.clone(), b.clone())
        } else {
            ComparedPair(b.clone(), a.clone())
        }
    }

    fn partner_of(&self, uid: &Uid) -> Option<&Uid> {
        if &self.0 == uid {
            Some(&self.1)
        } else if &self.1 == uid {
            Some(&self.0)
        } else {
            None
        }
    }
}

/// Per-user state behind a two-slot comparison screen.
pub struct ComparisonSession<S> {
    source: S,
    pool: SuggestionPool,
    slots: [SlotState; 2],
    compared: HashMap<PollKey, HashSet<ComparedPair>>,
}

impl<S: CandidateSource> ComparisonSession<S> {
    pub fn new(source: S) -> Self {
        Self::with_pool(source, SuggestionPool::new())
    }

    /// Build a session around an existing (usually seeded) pool.
    pub fn with_pool(source: S, pool: SuggestionPool) -> Self {
        Self {
            source,
            pool,
            slots: Default::default(),
            compared: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn pool(&self) -> &SuggestionPool {
        &self.pool
    }

    pub fn history(&self, slot: Slot) -> &CursorHistory {
        &self.slots[slot.index()].history
    }

    /// Identifier displayed in `slot` for `poll`, if any.
    pub fn current(&self, poll: &PollKey, slot: Slot) -> Option<&Uid> {
        self.slots[slot.index()].shown.get(poll)
    }

    /// Display an identifier the user chose explicitly.
    pub fn pick(&mut self, poll: &PollKey, slot: Slot, uid: Uid) {
        debug!("Slot {} in poll {} picked {}", slot, poll, uid);
        let state = &mut self.slots[slot.index()];
        state.history.append_right(poll, uid.clone());
        state.shown.insert(poll.clone(), uid);
    }

    /// Browse the slot's history one step in `direction`, falling back to a
    /// fresh suggestion. A `Some` result becomes the slot's displayed item;
    /// `None` keeps whatever was shown.
    pub async fn step(
        &mut self,
        poll: &PollKey,
        slot: Slot,
        direction: Direction,
    ) -> Result<Option<Uid>, S::Error> {
        let other = self.current(poll, slot.other()).cloned();
        let already_compared = match &other {
            Some(uid) => self.already_compared_with(poll, uid),
            None => Vec::new(),
        };

        let state = &mut self.slots[slot.index()];
        let current = state.shown.get(poll).cloned();
        let selection = Selection::new(poll)
            .current(current.as_ref())
            .other(other.as_ref())
            .already_compared(&already_compared);

        let next = browse_or_suggest(
            &mut state.history,
            &mut self.pool,
            &self.source,
            direction,
            &selection,
        )
        .await?;

        if let Some(uid) = &next {
            state.shown.insert(poll.clone(), uid.clone());
        }
        Ok(next)
    }

    /// Fill every empty slot with a suggestion. Slot A goes first so that
    /// slot B's draw already excludes it.
    pub async fn autofill(
        &mut self,
        poll: &PollKey,
    ) -> Result<(Option<Uid>, Option<Uid>), S::Error> {
        let mut filled = [None, None];
        for slot in [Slot::A, Slot::B] {
            if self.current(poll, slot).is_none() {
                filled[slot.index()] = self.step(poll, slot, Direction::Right).await?;
            }
        }
        let [a, b] = filled;
        Ok((a, b))
    }

    /// Remember that the pair currently on screen has been compared.
    ///
    /// Returns false when a slot is empty, both slots show the same item, or
    /// the pair was already recorded.
    pub fn record_comparison(&mut self, poll: &PollKey) -> bool {
        let (Some(a), Some(b)) = (self.current(poll, Slot::A), self.current(poll, Slot::B))
        else {
            return false;
        };
        if a == b {
            return false;
        }

        let pair = ComparedPair::new(a, b);
        let inserted = self.compared.entry(poll.clone()).or_default().insert(pair);
        if inserted {
            info!("Recorded comparison in poll {}", poll);
        }
        inserted
    }

    /// Identifiers already compared with `uid` in `poll`, sorted.
    pub fn already_compared_with(&self, poll: &PollKey, uid: &Uid) -> Vec<Uid> {
        let mut partners: Vec<Uid> = self
            .compared
            .get(poll)
            .into_iter()
            .flatten()
            .filter_map(|pair| pair.partner_of(uid).cloned())
            .collect();
        partners.sort();
        partners
    }

    /// Drop every trace of the user: pool, both histories, displayed items
    /// and recorded comparisons.
    pub fn logout(&mut self) {
        self.pool.clear();
        for state in &mut self.slots {
            state.history.clear();
            state.shown.clear();
        }
        self.compared.clear();
        info!("Comparison session cleared");
    }
}
