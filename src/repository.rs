//! The backend-agnostic repository engine.
//!
//! A [`Repository`] caches, per branch, the commits loaded from its
//! [`CommitSource`] together with the authors derived from them, and
//! answers ranking queries over that in-memory population.
//!
//! Each branch moves from "not loaded" to "loaded" exactly once. Loading
//! is serialized per branch: concurrent first-time callers wait for the
//! load in progress instead of starting another one. A failed load
//! leaves the branch unloaded.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::actor::Actor;
use crate::commit::{Commit, RawCommit};
use crate::error::{Error, Result};
use crate::vcs::{Capability, CommitSource, Registry, VcsDescriptor};

/// Number of authors returned by the author rankings unless told otherwise.
pub const DEFAULT_AUTHOR_COUNT: usize = 3;

/// Number of commits returned by `significant_commits` unless told otherwise.
pub const DEFAULT_COMMIT_COUNT: usize = 10;

/// Commits and authors of one branch, loaded together.
#[derive(Debug, Clone)]
pub struct BranchHistory {
    branch: String,
    commits: Vec<Arc<Commit>>,
    authors: IndexMap<String, Arc<Actor>>,
}

impl BranchHistory {
    /// Builds the history of `branch` from raw backend records.
    ///
    /// Authors are keyed by identity id and kept in discovery order. A
    /// commit id seen twice is only recorded once.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRecord`] for a record missing its commit or
    /// author id; nothing is built in that case.
    pub fn from_raw(branch: &str, raw: Vec<RawCommit>) -> Result<Self> {
        let mut commits: Vec<Arc<Commit>> = Vec::with_capacity(raw.len());
        let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
        let mut authors: IndexMap<String, Actor> = IndexMap::new();

        for record in raw {
            let commit = Arc::new(Commit::from_raw(record)?);
            if !seen.insert(commit.id().to_string()) {
                warn!(branch, commit = commit.id(), "skipping duplicate commit");
                continue;
            }

            authors
                .entry(commit.author().id.clone())
                .or_insert_with(|| Actor::new(commit.author().clone()))
                .add_commit(Arc::clone(&commit));
            commits.push(commit);
        }

        Ok(BranchHistory {
            branch: branch.to_string(),
            commits,
            authors: authors
                .into_iter()
                .map(|(id, actor)| (id, Arc::new(actor)))
                .collect(),
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Commits in the order the backend produced them.
    pub fn commits(&self) -> &[Arc<Commit>] {
        &self.commits
    }

    /// Authors keyed by id, in discovery order.
    pub fn authors(&self) -> &IndexMap<String, Arc<Actor>> {
        &self.authors
    }

    pub fn author(&self, id: &str) -> Option<&Arc<Actor>> {
        self.authors.get(id)
    }

    /// Resolves a commit's author through this branch's author map.
    pub fn author_of(&self, commit: &Commit) -> Option<&Arc<Actor>> {
        self.author(&commit.author().id)
    }
}

type BranchSlot = Mutex<Option<Arc<BranchHistory>>>;

/// A repository bound to one backend and one location.
pub struct Repository {
    vcs: VcsDescriptor,
    location: String,
    source: Box<dyn CommitSource>,
    branches: Mutex<HashMap<String, Arc<BranchSlot>>>,
}

impl Repository {
    /// Wraps an already constructed commit source.
    pub fn new(
        vcs: VcsDescriptor,
        location: impl Into<String>,
        source: Box<dyn CommitSource>,
    ) -> Self {
        Repository {
            vcs,
            location: location.into(),
            source,
            branches: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `backend` in `registry` and opens `location` with it.
    ///
    /// # Errors
    /// - [`Error::UnknownBackend`] if the backend is not registered.
    /// - [`Error::Backend`] if the backend cannot open the location.
    pub fn open(registry: &Registry, backend: &str, location: &str) -> Result<Self> {
        let vcs = registry.resolve(backend)?.clone();
        let source = vcs
            .open(location)
            .map_err(|e| Error::backend(&vcs.name, e))?;
        debug!(backend, location, "opened repository");
        Ok(Repository::new(vcs, location, source))
    }

    pub fn backend(&self) -> &str {
        &self.vcs.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn default_branch(&self) -> &str {
        &self.vcs.default_branch
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.vcs.supports(capability)
    }

    /// Whether `branch` has been loaded. Never triggers a load.
    pub fn is_loaded(&self, branch: Option<&str>) -> bool {
        let branch = self.branch_or_default(branch);
        let slot = lock(&self.branches).get(branch).cloned();
        slot.is_some_and(|slot| lock(&slot).is_some())
    }

    /// Returns the cached history of `branch`, loading it on first use.
    ///
    /// `None` selects the backend's default branch.
    ///
    /// # Errors
    /// Backend and record validation failures are returned unchanged and
    /// leave the branch unloaded.
    pub fn history(&self, branch: Option<&str>) -> Result<Arc<BranchHistory>> {
        let branch = self.branch_or_default(branch);
        let slot = Arc::clone(lock(&self.branches).entry(branch.to_string()).or_default());

        let mut cached = lock(&slot);
        if let Some(history) = cached.as_ref() {
            debug!(branch, "branch history cache hit");
            return Ok(Arc::clone(history));
        }

        debug!(backend = %self.vcs.name, location = %self.location, branch, "loading branch history");
        let raw = self
            .source
            .load_commits(branch)
            .map_err(|e| Error::backend(&self.vcs.name, e))?;
        let history = Arc::new(BranchHistory::from_raw(branch, raw)?);
        info!(
            branch,
            commits = history.commits.len(),
            authors = history.authors.len(),
            "loaded branch history"
        );

        *cached = Some(Arc::clone(&history));
        Ok(history)
    }

    /// All commits of `branch`, in backend order.
    pub fn commits(&self, branch: Option<&str>) -> Result<Vec<Arc<Commit>>> {
        Ok(self.history(branch)?.commits().to_vec())
    }

    /// All authors of `branch`, keyed by id.
    pub fn authors(&self, branch: Option<&str>) -> Result<IndexMap<String, Arc<Actor>>> {
        Ok(self.history(branch)?.authors().clone())
    }

    /// The `count` authors that changed the most lines, highest first.
    ///
    /// Authors with equal modifications keep their discovery order.
    ///
    /// # Errors
    /// [`Error::UnsupportedOperation`] if the backend lacks line statistics;
    /// this is checked before anything is loaded.
    pub fn significant_authors(&self, branch: Option<&str>, count: usize) -> Result<Vec<Arc<Actor>>> {
        self.require(Capability::LineStats)?;
        let authors: Vec<Arc<Actor>> = self.history(branch)?.authors().values().cloned().collect();
        Ok(top_by(authors, count, |a| a.modifications()))
    }

    /// The `count` commits that changed the most lines, highest first.
    ///
    /// # Errors
    /// [`Error::UnsupportedOperation`] if the backend lacks line statistics.
    pub fn significant_commits(&self, branch: Option<&str>, count: usize) -> Result<Vec<Arc<Commit>>> {
        self.require(Capability::LineStats)?;
        let commits = self.commits(branch)?;
        Ok(top_by(commits, count, |c| c.modifications()))
    }

    /// The `count` authors with the most commits, highest first.
    pub fn top_authors(&self, branch: Option<&str>, count: usize) -> Result<Vec<Arc<Actor>>> {
        let authors: Vec<Arc<Actor>> = self.history(branch)?.authors().values().cloned().collect();
        Ok(top_by(authors, count, |a| a.commit_count()))
    }

    fn branch_or_default<'a>(&'a self, branch: Option<&'a str>) -> &'a str {
        branch.unwrap_or(&self.vcs.default_branch)
    }

    fn require(&self, capability: Capability) -> Result<()> {
        if self.vcs.supports(capability) {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation {
                backend: self.vcs.name.clone(),
                capability,
            })
        }
    }
}

/// Orders by `metric` descending and keeps the first `count` items.
///
/// The sort is stable, so equal metrics keep their input order.
fn top_by<T, K: Ord>(mut items: Vec<T>, count: usize, metric: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by(|a, b| metric(b).cmp(&metric(a)));
    items.truncate(count);
    items
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
