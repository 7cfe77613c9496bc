use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::actor::Identity;
use crate::error::{Error, Result};

/// One history record as produced by a backend.
///
/// Backends fill every field before handing the record to the engine;
/// `additions`/`deletions` are `None` when the backend cannot compute
/// line statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub id: String,
    pub message: String,
    pub author: Identity,
    pub committer: Identity,
    pub authored_at: DateTime<Utc>,
    pub committed_at: DateTime<Utc>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

/// A single change-set on a branch.
///
/// Immutable once built. The author is a non-owning reference: its
/// [`Identity`] keys into the branch's author map.
#[derive(Debug, Clone)]
pub struct Commit {
    id: String,
    author: Identity,
    committer: Identity,
    authored_at: DateTime<Utc>,
    committed_at: DateTime<Utc>,
    message: String,
    additions: u64,
    deletions: u64,
}

impl Commit {
    /// Validates a raw record and turns it into a commit.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRecord`] if the commit id or the author id
    /// is empty.
    pub fn from_raw(raw: RawCommit) -> Result<Self> {
        if raw.id.trim().is_empty() {
            return Err(Error::InvalidRecord {
                id: raw.id,
                reason: "empty commit id".to_string(),
            });
        }
        if raw.author.id.trim().is_empty() {
            return Err(Error::InvalidRecord {
                id: raw.id,
                reason: "empty author id".to_string(),
            });
        }

        Ok(Commit {
            id: raw.id,
            author: raw.author,
            committer: raw.committer,
            authored_at: raw.authored_at,
            committed_at: raw.committed_at,
            message: raw.message,
            additions: raw.additions.unwrap_or(0),
            deletions: raw.deletions.unwrap_or(0),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn author(&self) -> &Identity {
        &self.author
    }

    pub fn committer(&self) -> &Identity {
        &self.committer
    }

    pub fn authored_at(&self) -> DateTime<Utc> {
        self.authored_at
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the first line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn additions(&self) -> u64 {
        self.additions
    }

    pub fn deletions(&self) -> u64 {
        self.deletions
    }

    /// Lines added plus lines deleted.
    pub fn modifications(&self) -> u64 {
        self.additions + self.deletions
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Commit {}

impl Hash for Commit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(id: &str, author_id: &str) -> RawCommit {
        let author = Identity::new(author_id, "Alice", "alice@example.com");
        let committer = Identity::new("bot", "Merge Bot", "bot@example.com");
        RawCommit {
            id: id.to_string(),
            message: "Fix parser\n\nHandles trailing commas.".to_string(),
            author,
            committer,
            authored_at: Utc.timestamp_opt(1_300_000_000, 0).unwrap(),
            committed_at: Utc.timestamp_opt(1_300_000_600, 0).unwrap(),
            additions: None,
            deletions: None,
        }
    }

    #[test]
    fn from_raw_keeps_fields_and_defaults_line_stats() {
        let c = Commit::from_raw(raw("c1", "alice")).unwrap();
        assert_eq!(c.id(), "c1");
        assert_eq!(c.author().id, "alice");
        assert_eq!(c.committer().id, "bot");
        assert_eq!(c.summary(), "Fix parser");
        assert_eq!(c.additions(), 0);
        assert_eq!(c.deletions(), 0);
        assert_eq!(c.modifications(), 0);
        assert!(c.committed_at() > c.authored_at());
    }

    #[test]
    fn modifications_add_both_counts() {
        let mut r = raw("c1", "alice");
        r.additions = Some(10);
        r.deletions = Some(2);
        assert_eq!(Commit::from_raw(r).unwrap().modifications(), 12);
    }

    #[test]
    fn from_raw_rejects_missing_ids() {
        let err = Commit::from_raw(raw("  ", "alice")).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));

        let err = Commit::from_raw(raw("c2", "")).unwrap_err();
        match err {
            Error::InvalidRecord { id, reason } => {
                assert_eq!(id, "c2");
                assert_eq!(reason, "empty author id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn summary_of_empty_message_is_empty() {
        let mut r = raw("c1", "alice");
        r.message = String::new();
        assert_eq!(Commit::from_raw(r).unwrap().summary(), "");
    }
}
