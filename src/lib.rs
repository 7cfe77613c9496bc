//! Crate entry point for **metior**.
//!
//! metior answers questions about a repository's history ("who are the
//! top contributors on this branch", "which commits changed the most
//! code") without the caller knowing where the history comes from. A
//! local git checkout and a GitHub repository are queried the same way.
//!
//! Each submodule encapsulates one responsibility:
//! - [`vcs`]: backend descriptors, capabilities and the registry
//! - [`repository`]: the per-branch cache and the ranking queries
//! - [`actor`] / [`commit`]: the contributor and change-set entities
//! - [`git`] / [`github`]: the bundled backends
//! - [`config`]: `config.toml` loading
//!
//! ```no_run
//! use metior::{Registry, Repository};
//!
//! # fn main() -> metior::Result<()> {
//! let registry = Registry::builtin();
//! let repo = Repository::open(&registry, "git", ".")?;
//! for author in repo.top_authors(Some("main"), 3)? {
//!     println!("{} ({} commits)", author.name(), author.commit_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod commands;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
mod paths;
mod progress;
pub mod repository;
pub mod vcs;

/// Re-export commonly used types and commands so they can be accessed from `metior::*`.
pub use actor::{Actor, Identity};
pub use commands::{Query, cmd_backends, cmd_query};
pub use commit::{Commit, RawCommit};
pub use config::{Settings, load_config, load_config_from};
pub use error::{Error, Result};
pub use paths::metior_home;
pub use repository::{BranchHistory, DEFAULT_AUTHOR_COUNT, DEFAULT_COMMIT_COUNT, Repository};
pub use vcs::{Capability, CommitSource, Registry, VcsDescriptor};
