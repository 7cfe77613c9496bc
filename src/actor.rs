use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::commit::Commit;

/// The contributor triple attached to every commit.
///
/// `id` is backend-defined (an email for git, a login for GitHub) and is
/// the key under which the contributor's [`Actor`] is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Identity {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A contributor on one branch, together with the commits they authored.
///
/// Actors are created the first time a commit by their identity is seen
/// while loading a branch. Equality and hashing only consider the id.
#[derive(Debug, Clone)]
pub struct Actor {
    identity: Identity,
    commits: Vec<Arc<Commit>>,
}

impl Actor {
    pub fn new(identity: Identity) -> Self {
        Actor {
            identity,
            commits: Vec::new(),
        }
    }

    /// Records a commit authored by this actor.
    pub fn add_commit(&mut self, commit: Arc<Commit>) {
        self.commits.push(commit);
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Commits authored by this actor, in discovery order.
    pub fn commits(&self) -> &[Arc<Commit>] {
        &self.commits
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// Total lines added and deleted across all owned commits.
    ///
    /// Zero when the backend does not report line statistics.
    pub fn modifications(&self) -> u64 {
        self.commits.iter().map(|c| c.modifications()).sum()
    }
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.identity.id == other.identity.id
    }
}

impl Eq for Actor {}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.id.hash(state);
    }
}
