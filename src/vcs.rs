//! Backend registry.
//!
//! A backend is described by a [`VcsDescriptor`]: its short name, the
//! branch queries fall back to, the optional features it can supply and a
//! factory that builds a [`CommitSource`] for a given location. The
//! statistics engine asks the descriptor, never the concrete backend,
//! whether a feature is available.
//!
//! The registry is an ordinary value. Build it once at startup (see
//! [`Registry::builtin`] and `Settings::registry`), then share it by
//! reference; it is not mutated while queries run.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::commit::RawCommit;
use crate::error::{Error, Result};
use crate::{git, github};

/// Optional features a backend may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum Capability {
    /// Per-commit line additions/deletions are available.
    LineStats,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::LineStats => "line_stats",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of raw history for one repository location.
///
/// Implementations only produce the ordered records; turning them into
/// actors and commits and caching them is the engine's job.
pub trait CommitSource: Send + Sync {
    /// Loads every commit reachable from `branch`, in backend order.
    fn load_commits(&self, branch: &str) -> anyhow::Result<Vec<RawCommit>>;
}

/// Builds a [`CommitSource`] for a location (a path, `owner/repo`, ...).
pub type Factory = Arc<dyn Fn(&str) -> anyhow::Result<Box<dyn CommitSource>> + Send + Sync>;

/// Everything the engine needs to know about a backend.
#[derive(Clone)]
pub struct VcsDescriptor {
    pub name: String,
    pub default_branch: String,
    pub capabilities: BTreeSet<Capability>,
    pub factory: Factory,
}

impl VcsDescriptor {
    pub fn new<F>(
        name: impl Into<String>,
        default_branch: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
        factory: F,
    ) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Box<dyn CommitSource>> + Send + Sync + 'static,
    {
        VcsDescriptor {
            name: name.into(),
            default_branch: default_branch.into(),
            capabilities: capabilities.into_iter().collect(),
            factory: Arc::new(factory),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Runs the factory for `location`.
    pub fn open(&self, location: &str) -> anyhow::Result<Box<dyn CommitSource>> {
        (self.factory)(location)
    }
}

impl fmt::Debug for VcsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcsDescriptor")
            .field("name", &self.name)
            .field("default_branch", &self.default_branch)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Name → descriptor mapping.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    backends: HashMap<String, VcsDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the bundled `git` and `github` backends.
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        registry.register(git::descriptor());
        registry.register(github::descriptor(github::GitHubOptions::default()));
        registry
    }

    /// Stores a descriptor under its name, replacing any previous one.
    pub fn register(&mut self, descriptor: VcsDescriptor) {
        if self.backends.contains_key(&descriptor.name) {
            tracing::debug!(backend = %descriptor.name, "replacing registered backend");
        }
        self.backends.insert(descriptor.name.clone(), descriptor);
    }

    /// # Errors
    /// Returns [`Error::UnknownBackend`] if `name` was never registered.
    pub fn resolve(&self, name: &str) -> Result<&VcsDescriptor> {
        self.backends
            .get(name)
            .ok_or_else(|| Error::UnknownBackend(name.to_string()))
    }

    /// Whether the backend registered as `name` declares `capability`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownBackend`] if `name` was never registered.
    pub fn supports(&self, name: &str, capability: Capability) -> Result<bool> {
        Ok(self.resolve(name)?.supports(capability))
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
