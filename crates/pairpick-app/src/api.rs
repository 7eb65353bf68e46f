// HTTP candidate source backed by the ranking API's "to compare" suggestions
// endpoint.
//
// GET {base_url}/users/me/suggestions/{poll}/tocompare/?limit=N returns a JSON
// array of `{"entity": {"uid": ...}, ...}` objects. The endpoint has no
// exclusion parameter, so excluded identifiers are dropped client-side.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use pairpick_core::{CandidateSource, PollKey, Uid};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("candidate request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("candidate endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode candidate batch: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SuggestionEntry {
    entity: EntityRef,
}

#[derive(Debug, Deserialize)]
struct EntityRef {
    uid: String,
}

/// Decode a suggestions payload into identifiers, skipping anything in
/// `exclude`. Extra fields in each entry are ignored.
pub fn parse_candidates(body: &[u8], exclude: &[Uid]) -> Result<Vec<Uid>, ApiError> {
    let entries: Vec<SuggestionEntry> = serde_json::from_slice(body)?;
    let excluded: HashSet<&str> = exclude.iter().map(Uid::as_str).collect();

    Ok(entries
        .into_iter()
        .map(|entry| entry.entity.uid)
        .filter(|uid| !excluded.contains(uid.as_str()))
        .map(Uid::from)
        .collect())
}

// ---------------------------------------------------------------------------
// HttpCandidateSource
// ---------------------------------------------------------------------------

/// Fetches candidate batches over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCandidateSource {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    limit: Option<u32>,
}

impl HttpCandidateSource {
    /// Create a source for the API rooted at `base_url`. Every request is
    /// bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".into(),
            });
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            token: None,
            limit: None,
        })
    }

    /// Build a source from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let source = Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
        )?
        .with_limit(config.api.batch_limit)
        .with_token(config.credentials.api_token.clone());
        Ok(source)
    }

    /// Send `Authorization: Bearer <token>`. Blank tokens are ignored.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// `{base_url}/users/me/suggestions/{poll}/tocompare/`, with the poll
    /// name percent-encoded as a single path segment.
    pub fn endpoint(&self, poll: &PollKey) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "users",
                "me",
                "suggestions",
                poll.as_str(),
                "tocompare",
                "",
            ]);
        }
        url
    }
}

#[async_trait]
impl CandidateSource for HttpCandidateSource {
    type Error = ApiError;

    async fn fetch_candidates(
        &self,
        poll: &PollKey,
        exclude: &[Uid],
    ) -> Result<Vec<Uid>, ApiError> {
        let url = self.endpoint(poll);
        debug!("Requesting candidates from {}", url);

        let mut request = self.http.get(url);
        if let Some(limit) = self.limit {
            request = request.query(&[("limit", limit)]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Candidate endpoint for poll {} answered {}", poll, status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let candidates = parse_candidates(&body, exclude)?;
        debug!("Received {} candidates for poll {}", candidates.len(), poll);
        Ok(candidates)
    }
}
