//! GitHub REST API backend.
//!
//! Commits are listed through `GET /repos/{owner}/{repo}/commits`. The
//! listing does not carry per-commit line counts, so this backend does not
//! declare line statistics and only supports commit-count rankings.

mod client;

use serde::Deserialize;

use crate::vcs::{CommitSource, VcsDescriptor};

/// Name the GitHub backend is registered under.
pub const NAME: &str = "github";

/// Branch used when a query does not name one.
pub const DEFAULT_BRANCH: &str = "master";

pub use client::GitHubBackend;

/// Client settings, read from the `[github]` section of `config.toml`.
///
/// Example TOML:
/// ```toml
/// [github]
/// api_url  = "https://github.example.com/api/v3"
/// per_page = 50
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitHubOptions {
    pub api_url: String,
    pub per_page: u32,
    /// Falls back to `$GITHUB_TOKEN` when unset.
    pub token: Option<String>,
}

impl Default for GitHubOptions {
    fn default() -> Self {
        GitHubOptions {
            api_url: "https://api.github.com".to_string(),
            per_page: 100,
            token: None,
        }
    }
}

/// Descriptor for the GitHub backend; locations are `owner/repo`.
pub fn descriptor(options: GitHubOptions) -> VcsDescriptor {
    VcsDescriptor::new(NAME, DEFAULT_BRANCH, [], move |location| {
        Ok(Box::new(GitHubBackend::new(location, &options)?) as Box<dyn CommitSource>)
    })
}
