use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, Oid, Repository, Signature, Sort};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::actor::Identity;
use crate::commit::RawCommit;
use crate::vcs::CommitSource;

/// Commit source reading a local repository through libgit2.
///
/// Only the git directory is kept; a fresh `git2::Repository` is opened
/// for every load because libgit2 handles cannot be shared across threads.
#[derive(Debug, Clone)]
pub struct GitBackend {
    git_dir: PathBuf,
}

impl GitBackend {
    /// Locate the repository containing `location` (the path itself or
    /// any parent directory).
    ///
    /// # Errors
    /// Returns an error if no repository can be found or opened.
    pub fn discover(location: impl AsRef<Path>) -> Result<Self> {
        let location = location.as_ref();
        let repo = Repository::discover(location)
            .with_context(|| format!("failed to open git repository at {}", location.display()))?;
        debug!(git_dir = %repo.path().display(), "discovered git repository");
        Ok(GitBackend {
            git_dir: repo.path().to_path_buf(),
        })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

impl CommitSource for GitBackend {
    /// Walk the history reachable from `branch`, newest first.
    fn load_commits(&self, branch: &str) -> Result<Vec<RawCommit>> {
        let repo = Repository::open(&self.git_dir)
            .with_context(|| format!("failed to open {}", self.git_dir.display()))?;
        let tip = resolve_branch(&repo, branch)?;

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        revwalk.push(tip)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            commits.push(to_raw(&repo, &commit)?);
        }
        debug!(branch, count = commits.len(), "walked git history");
        Ok(commits)
    }
}

/// Resolve a branch name to the commit it points at.
///
/// Resolution order:
/// 1. Local branch (`refs/heads/<branch>`)
/// 2. Remote branch (`refs/remotes/origin/<branch>`)
/// 3. Any revspec (tag, SHA, `HEAD~3`, ...)
///
/// # Errors
/// Returns an error if none of the above resolves to a commit.
fn resolve_branch(repo: &Repository, branch: &str) -> Result<Oid> {
    if let Ok(reference) = repo.find_reference(&format!("refs/heads/{}", branch)) {
        return Ok(reference.peel_to_commit()?.id());
    }

    if let Ok(reference) = repo.find_reference(&format!("refs/remotes/origin/{}", branch)) {
        return Ok(reference.peel_to_commit()?.id());
    }

    let obj = repo
        .revparse_single(branch)
        .with_context(|| format!("branch not found: {}", branch))?;
    let commit = obj
        .peel_to_commit()
        .map_err(|_| anyhow!("{} didn't peel to a commit", branch))?;
    Ok(commit.id())
}

/// Build the raw record for one commit, including aggregate line counts
/// against its first parent (or the empty tree for a root commit).
fn to_raw(repo: &Repository, commit: &Commit) -> Result<RawCommit> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
    let stats = diff.stats()?;

    let author = commit.author();
    let committer = commit.committer();

    Ok(RawCommit {
        id: commit.id().to_string(),
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        authored_at: timestamp(&author)?,
        committed_at: timestamp(&committer)?,
        author: identity(&author),
        committer: identity(&committer),
        additions: Some(stats.insertions() as u64),
        deletions: Some(stats.deletions() as u64),
    })
}

/// Actors are keyed by email; signatures without one fall back to the name.
fn identity(sig: &Signature) -> Identity {
    let name = String::from_utf8_lossy(sig.name_bytes()).into_owned();
    let email = String::from_utf8_lossy(sig.email_bytes()).into_owned();
    let id = if email.trim().is_empty() {
        name.clone()
    } else {
        email.clone()
    };
    Identity { id, name, email }
}

fn timestamp(sig: &Signature) -> Result<DateTime<Utc>> {
    let seconds = sig.when().seconds();
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| anyhow!("invalid commit timestamp: {}", seconds))
}
