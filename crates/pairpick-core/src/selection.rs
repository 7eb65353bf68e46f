// Selection orchestration: pick the next identifier for a comparison slot.
//
// Browsing existing history wins; otherwise a fresh suggestion is drawn from
// the pool, which is refilled from the candidate source when it runs dry. The
// fetch is the only suspension point. `fill` runs strictly after the fetch
// resolves, so dropping the future mid-fetch leaves the pool untouched.

use tracing::{debug, info};

use crate::history::{CursorHistory, Direction};
use crate::poll::{PollKey, Uid};
use crate::pool::SuggestionPool;
use crate::source::CandidateSource;

/// What is already on screen when a slot asks for its next identifier.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub poll: &'a PollKey,
    /// Identifier currently displayed by the slot being refreshed.
    pub current: Option<&'a Uid>,
    /// Identifier displayed by the paired slot.
    pub other: Option<&'a Uid>,
    /// Identifiers the user has already compared with `other`.
    pub already_compared: &'a [Uid],
}

impl<'a> Selection<'a> {
    pub fn new(poll: &'a PollKey) -> Self {
        Self {
            poll,
            current: None,
            other: None,
            already_compared: &[],
        }
    }

    pub fn current(mut self, uid: Option<&'a Uid>) -> Self {
        self.current = uid;
        self
    }

    pub fn other(mut self, uid: Option<&'a Uid>) -> Self {
        self.other = uid;
        self
    }

    pub fn already_compared(mut self, uids: &'a [Uid]) -> Self {
        self.already_compared = uids;
        self
    }

    /// Identifiers kept out of a refill: the paired item and its known
    /// partners.
    fn refill_exclusion(&self) -> Vec<Uid> {
        self.other
            .into_iter()
            .chain(self.already_compared)
            .cloned()
            .collect()
    }

    /// Identifiers that may not be drawn: both items on screen.
    fn draw_exclusion(&self) -> Vec<Uid> {
        self.current.into_iter().chain(self.other).cloned().collect()
    }
}

/// Draw a fresh suggestion for `selection.poll`, refilling the pool first
/// when it is empty.
///
/// `Ok(None)` means nothing is left to suggest, even after a refill. A fetch
/// failure is returned as-is and leaves the pool unchanged.
pub async fn suggest<S>(
    pool: &mut SuggestionPool,
    source: &S,
    selection: &Selection<'_>,
) -> Result<Option<Uid>, S::Error>
where
    S: CandidateSource + ?Sized,
{
    let poll = selection.poll;

    if pool.is_empty(poll) {
        let exclude = selection.refill_exclusion();
        info!("Pool for poll {} is empty, fetching candidates", poll);
        let batch = source.fetch_candidates(poll, &exclude).await?;
        info!("Fetched {} candidates for poll {}", batch.len(), poll);
        pool.fill(poll, batch, &exclude);
    }

    let drawn = pool.random(poll, &selection.draw_exclusion());
    match &drawn {
        Some(uid) => debug!("Suggested {} for poll {}", uid, poll),
        None => debug!("No suggestion left for poll {}", poll),
    }
    Ok(drawn)
}

/// Move a slot's history one step in `direction`, or, when the history has
/// nothing further that way, suggest a new identifier and append it at that
/// end so the cursor lands on it.
pub async fn browse_or_suggest<S>(
    history: &mut CursorHistory,
    pool: &mut SuggestionPool,
    source: &S,
    direction: Direction,
    selection: &Selection<'_>,
) -> Result<Option<Uid>, S::Error>
where
    S: CandidateSource + ?Sized,
{
    if history.has_next(selection.poll, direction) {
        return Ok(history.step(selection.poll, direction));
    }

    let suggestion = suggest(pool, source, selection).await?;
    if let Some(uid) = &suggestion {
        history.append(selection.poll, uid.clone(), direction);
    }
    Ok(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::uids;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream unavailable")]
    struct Unavailable;

    /// Returns the same batch on every call and records what it was asked.
    struct StubSource {
        batch: Vec<Uid>,
        calls: AtomicUsize,
        last_exclude: Mutex<Vec<Uid>>,
    }

    impl StubSource {
        fn new(batch: &[&str]) -> Self {
            Self {
                batch: uids(batch.iter().copied()),
                calls: AtomicUsize::new(0),
                last_exclude: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CandidateSource for StubSource {
        type Error = Unavailable;

        async fn fetch_candidates(
            &self,
            _poll: &PollKey,
            exclude: &[Uid],
        ) -> Result<Vec<Uid>, Unavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_exclude.lock().unwrap() = exclude.to_vec();
            Ok(self.batch.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CandidateSource for FailingSource {
        type Error = Unavailable;

        async fn fetch_candidates(
            &self,
            _poll: &PollKey,
            _exclude: &[Uid],
        ) -> Result<Vec<Uid>, Unavailable> {
            Err(Unavailable)
        }
    }

    struct HangingSource;

    #[async_trait]
    impl CandidateSource for HangingSource {
        type Error = Unavailable;

        async fn fetch_candidates(
            &self,
            _poll: &PollKey,
            _exclude: &[Uid],
        ) -> Result<Vec<Uid>, Unavailable> {
            std::future::pending().await
        }
    }

    fn foo() -> PollKey {
        PollKey::from("foo")
    }

    #[tokio::test]
    async fn refills_only_when_empty() {
        let source = StubSource::new(&["uid1", "uid2"]);
        let mut pool = SuggestionPool::new();
        let poll = foo();
        let selection = Selection::new(&poll);

        let first = suggest(&mut pool, &source, &selection).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert!(!pool.is_empty(&poll));

        let second = suggest(&mut pool, &source, &selection).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert!(pool.is_empty(&poll));

        let mut got = vec![first.unwrap().into_inner(), second.unwrap().into_inner()];
        got.sort();
        assert_eq!(got, vec!["uid1", "uid2"]);

        // Empty again: the next call fetches a new batch.
        suggest(&mut pool, &source, &selection).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn refill_excludes_other_and_already_compared() {
        let source = StubSource::new(&["uid1", "uid2", "uid3", "uid4"]);
        let mut pool = SuggestionPool::new();
        let poll = foo();
        let other = Uid::from("uid4");
        let compared = uids(["uid3"]);
        let selection = Selection::new(&poll)
            .other(Some(&other))
            .already_compared(&compared);

        let drawn = suggest(&mut pool, &source, &selection)
            .await
            .unwrap()
            .unwrap();

        assert!(drawn == "uid1" || drawn == "uid2");
        assert_eq!(*source.last_exclude.lock().unwrap(), uids(["uid4", "uid3"]));
        assert_eq!(pool.len(&poll), 1);
        assert_ne!(pool.random(&poll, &[]), Some(Uid::from("uid3")));
    }

    #[tokio::test]
    async fn draw_skips_items_on_screen() {
        let source = StubSource::new(&["uid1", "uid2", "uid3"]);
        let mut pool = SuggestionPool::new();
        let poll = foo();
        pool.fill(&poll, uids(["uid1", "uid2", "uid3"]), &[]);

        let current = Uid::from("uid1");
        let other = Uid::from("uid2");
        let selection = Selection::new(&poll)
            .current(Some(&current))
            .other(Some(&other));

        let drawn = suggest(&mut pool, &source, &selection).await.unwrap();
        assert_eq!(drawn, Some(Uid::from("uid3")));
        assert_eq!(source.calls(), 0);

        // uid1 and uid2 remain but are both on screen.
        let drawn = suggest(&mut pool, &source, &selection).await.unwrap();
        assert!(drawn.is_none());
        assert_eq!(pool.len(&poll), 2);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn empty_refill_yields_none() {
        let source = StubSource::new(&[]);
        let mut pool = SuggestionPool::new();
        let poll = foo();

        let drawn = suggest(&mut pool, &source, &Selection::new(&poll))
            .await
            .unwrap();
        assert!(drawn.is_none());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn refill_of_only_excluded_items_yields_none() {
        let source = StubSource::new(&["uid1"]);
        let mut pool = SuggestionPool::new();
        let poll = foo();
        let other = Uid::from("uid1");

        let drawn = suggest(&mut pool, &source, &Selection::new(&poll).other(Some(&other)))
            .await
            .unwrap();
        assert!(drawn.is_none());
        assert!(pool.is_empty(&poll));
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let mut pool = SuggestionPool::new();
        let poll = foo();

        let result = suggest(&mut pool, &FailingSource, &Selection::new(&poll)).await;
        assert!(matches!(result, Err(Unavailable)));
        assert!(pool.is_empty(&poll));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_fetch_writes_nothing() {
        let mut pool = SuggestionPool::new();
        let poll = foo();
        let selection = Selection::new(&poll);

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            suggest(&mut pool, &HangingSource, &selection),
        )
        .await;

        assert!(outcome.is_err());
        assert!(pool.is_empty(&poll));
    }

    #[tokio::test]
    async fn browse_prefers_history() {
        let source = StubSource::new(&["fresh"]);
        let mut pool = SuggestionPool::new();
        let mut history = CursorHistory::new();
        let poll = foo();
        history.append_right(&poll, Uid::from("old1"));
        history.append_right(&poll, Uid::from("old2"));

        let got = browse_or_suggest(
            &mut history,
            &mut pool,
            &source,
            Direction::Left,
            &Selection::new(&poll),
        )
        .await
        .unwrap();

        assert_eq!(got, Some(Uid::from("old1")));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn browse_appends_suggestion_at_the_moving_end() {
        let source = StubSource::new(&["fresh"]);
        let mut pool = SuggestionPool::new();
        let mut history = CursorHistory::new();
        let poll = foo();
        history.append_right(&poll, Uid::from("old"));

        let got = browse_or_suggest(
            &mut history,
            &mut pool,
            &source,
            Direction::Right,
            &Selection::new(&poll),
        )
        .await
        .unwrap();

        assert_eq!(got, Some(Uid::from("fresh")));
        assert_eq!(history.len(&poll), 2);
        assert!(!history.has_next_right(&poll));
        assert_eq!(history.move_left(&poll), Some(Uid::from("old")));
    }

    #[tokio::test]
    async fn browse_leaves_history_alone_when_nothing_to_suggest() {
        let source = StubSource::new(&[]);
        let mut pool = SuggestionPool::new();
        let mut history = CursorHistory::new();
        let poll = foo();

        let got = browse_or_suggest(
            &mut history,
            &mut pool,
            &source,
            Direction::Left,
            &Selection::new(&poll),
        )
        .await
        .unwrap();

        assert!(got.is_none());
        assert!(history.is_empty(&poll));
    }
}
