// Typed keys for poll-scoped state and the identifiers being compared.

use std::borrow::Borrow;
use std::fmt;

/// Identifies an independent comparison activity. Every pool and history
/// entry is partitioned by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PollKey(String);

impl PollKey {
    pub fn new(name: impl Into<String>) -> Self {
        PollKey(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PollKey {
    fn from(s: &str) -> Self {
        PollKey(s.to_string())
    }
}

impl From<String> for PollKey {
    fn from(s: String) -> Self {
        PollKey(s)
    }
}

/// Opaque name of a comparable entity. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(String);

impl Uid {
    pub fn new(uid: impl Into<String>) -> Self {
        Uid(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Uid(s.to_string())
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Uid(s)
    }
}

// Lets `HashSet<&str>` lookups and `HashMap<Uid, _>` queries by `&str` work.
impl Borrow<str> for Uid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Uid {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Uid {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Build a `Vec<Uid>` from string literals. Mostly useful in tests and
/// when adapting host data.
pub fn uids<I, S>(items: I) -> Vec<Uid>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Uid::new).collect()
}
