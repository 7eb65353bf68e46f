// Suggestion pool: a per-poll reservoir of candidate identifiers handed out
// uniformly at random, each at most once per fill.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::poll::{PollKey, Uid};

/// Refillable, poll-scoped reservoir of not-yet-shown identifiers.
///
/// The backing storage per poll is a plain `Vec` used as a removable
/// multiset: order is irrelevant and duplicates supplied by a fill are
/// drawn as separate items.
#[derive(Debug)]
pub struct SuggestionPool {
    suggestions: HashMap<PollKey, Vec<Uid>>,
    rng: StdRng,
}

impl Default for SuggestionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionPool {
    /// Create an empty pool seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            suggestions: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Create an empty pool with a deterministic draw order.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            suggestions: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// True when the poll has never been filled or every item was drawn.
    pub fn is_empty(&self, poll: &PollKey) -> bool {
        self.suggestions.get(poll).map_or(true, Vec::is_empty)
    }

    /// Number of undrawn identifiers for `poll`.
    pub fn len(&self, poll: &PollKey) -> usize {
        self.suggestions.get(poll).map_or(0, Vec::len)
    }

    /// Replace the pool of `poll` with `uids`, minus anything in `exclude`.
    ///
    /// Whatever remained from a previous fill is discarded.
    pub fn fill<I>(&mut self, poll: &PollKey, uids: I, exclude: &[Uid])
    where
        I: IntoIterator<Item = Uid>,
    {
        let excluded: HashSet<&str> = exclude.iter().map(Uid::as_str).collect();
        let kept: Vec<Uid> = uids
            .into_iter()
            .filter(|uid| !excluded.contains(uid.as_str()))
            .collect();

        debug!("Pool for poll {} filled with {} candidates", poll, kept.len());
        self.suggestions.insert(poll.clone(), kept);
    }

    /// Draw and remove one identifier of `poll` that is not in `exclude`.
    ///
    /// Returns `None` without touching the pool when nothing is eligible.
    pub fn random(&mut self, poll: &PollKey, exclude: &[Uid]) -> Option<Uid> {
        let entries = self.suggestions.get_mut(poll)?;

        let excluded: HashSet<&str> = exclude.iter().map(Uid::as_str).collect();
        let eligible: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, uid)| !excluded.contains(uid.as_str()))
            .map(|(idx, _)| idx)
            .collect();

        if eligible.is_empty() {
            return None;
        }

        let picked = eligible[self.rng.gen_range(0..eligible.len())];
        // Only the drawn slot leaves the pool; excluded items stay available.
        Some(entries.swap_remove(picked))
    }

    /// Drop every poll's reservoir. Call at logout.
    pub fn clear(&mut self) {
        self.suggestions.clear();
    }
}
