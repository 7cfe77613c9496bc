//! Git integration layer.
//!
//! This module wraps the actual backend implementation (`git2_backend`)
//! and exposes only what the registry needs: the backend name, its
//! default branch and a descriptor whose factory opens a local repository.
//!
//! The rest of the crate never touches `git2` directly, so the libgit2
//! binding stays an implementation detail of this module.

mod git2_backend;

use crate::vcs::{Capability, CommitSource, VcsDescriptor};

/// Name the git backend is registered under.
pub const NAME: &str = "git";

/// Branch used when a query does not name one.
pub const DEFAULT_BRANCH: &str = "master";

pub use git2_backend::GitBackend;

/// Descriptor for the local git backend. Line statistics are available.
pub fn descriptor() -> VcsDescriptor {
    VcsDescriptor::new(NAME, DEFAULT_BRANCH, [Capability::LineStats], |location| {
        Ok(Box::new(GitBackend::discover(location)?) as Box<dyn CommitSource>)
    })
}
