// The one capability the core needs from its host: fetching a fresh batch of
// candidates for a poll.

use async_trait::async_trait;

use crate::poll::{PollKey, Uid};

/// Supplies candidate identifiers when a poll's pool runs dry.
///
/// Implementations own transport concerns (timeouts, auth, retries). Their
/// error type reaches the caller of the selection functions unchanged.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch a batch of candidates for `poll`. `exclude` lists identifiers
    /// the caller will drop anyway; sources may use it to avoid sending
    /// them.
    async fn fetch_candidates(
        &self,
        poll: &PollKey,
        exclude: &[Uid],
    ) -> Result<Vec<Uid>, Self::Error>;
}
