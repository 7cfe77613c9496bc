//! Command implementations behind the `metior` CLI.
//!
//! Each command loads settings, builds the registry, opens the repository
//! and prints plain lines to stdout. Progress and errors go to stderr.

use anyhow::{Result, bail};
use indicatif::{MultiProgress, ProgressBar};
use rayon::prelude::*;
use std::time::Duration;

use crate::actor::Actor;
use crate::commit::Commit;
use crate::config::Settings;
use crate::progress::{err_style, ok_style, spinner_style};
use crate::repository::Repository;
use crate::vcs::Capability;

/// A ranking or listing to run against one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Authors,
    Commits,
    TopAuthors(usize),
    SignificantAuthors(usize),
    SignificantCommits(usize),
}

/// Render the output lines of `query` for `branch`.
///
/// # Errors
/// Propagates every repository error unchanged.
pub fn render(repo: &Repository, branch: Option<&str>, query: Query) -> crate::Result<Vec<String>> {
    let lines: Vec<String> = match query {
        Query::Authors => repo
            .authors(branch)?
            .values()
            .map(|a| format!("- {} ({} commits)", who(a), a.commit_count()))
            .collect(),
        Query::Commits => repo
            .commits(branch)?
            .iter()
            .map(|c| {
                format!(
                    "{} {} {}: {}",
                    short_id(c),
                    c.authored_at().format("%Y-%m-%d"),
                    c.author().name,
                    c.summary()
                )
            })
            .collect(),
        Query::TopAuthors(count) => ranked(repo.top_authors(branch, count)?, |a| {
            format!("{} ({} commits)", who(a), a.commit_count())
        }),
        Query::SignificantAuthors(count) => ranked(repo.significant_authors(branch, count)?, |a| {
            format!("{} ({} lines changed)", who(a), a.modifications())
        }),
        Query::SignificantCommits(count) => ranked(repo.significant_commits(branch, count)?, |c| {
            format!(
                "{} {} (+{}/-{})",
                short_id(c),
                c.summary(),
                c.additions(),
                c.deletions()
            )
        }),
    };
    Ok(lines)
}

fn ranked<T>(items: Vec<T>, line: impl Fn(&T) -> String) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, line(item)))
        .collect()
}

fn who(actor: &Actor) -> String {
    if actor.email().is_empty() {
        actor.name().to_string()
    } else {
        format!("{} <{}>", actor.name(), actor.email())
    }
}

fn short_id(commit: &Commit) -> &str {
    commit.id().get(..7).unwrap_or(commit.id())
}

/// CLI command: run `query` on each branch of the repository at `location`.
///
/// Branches are loaded **in parallel**, each with its own spinner, and the
/// results are printed in argument order once all of them finished. With
/// no branch the backend's default branch is used.
///
/// # Errors
/// - Returns an error if the backend is unknown or cannot open `location`.
/// - Returns an error if any branch failed; the other branches are still
///   printed.
pub fn cmd_query(
    settings: &Settings,
    backend: Option<&str>,
    location: &str,
    branches: &[String],
    query: Query,
) -> Result<()> {
    let registry = settings.registry()?;
    let repo = Repository::open(&registry, settings.backend(backend), location)?;

    let targets: Vec<&str> = if branches.is_empty() {
        vec![repo.default_branch()]
    } else {
        branches.iter().map(String::as_str).collect()
    };

    let mp = MultiProgress::new();
    let mut bars: Vec<ProgressBar> = Vec::with_capacity(targets.len());
    for branch in &targets {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(spinner_style());
        pb.set_message(format!("loading {}", branch));
        pb.enable_steady_tick(Duration::from_millis(80));
        bars.push(pb);
    }

    let results: Vec<crate::Result<Vec<String>>> = targets
        .par_iter()
        .enumerate()
        .map(|(idx, branch)| {
            let pb = &bars[idx];
            let res = render(&repo, Some(*branch), query);
            match &res {
                Ok(_) => {
                    pb.set_style(ok_style());
                    pb.finish_with_message(format!("loaded {}", branch));
                }
                Err(e) => {
                    pb.set_style(err_style());
                    pb.finish_with_message(format!("{} (error: {})", branch, e));
                }
            }
            res
        })
        .collect();

    let mut failed = 0;
    for (branch, res) in targets.iter().zip(results) {
        match res {
            Ok(lines) => {
                if targets.len() > 1 {
                    println!("{}:", branch);
                }
                for line in lines {
                    println!("{}", line);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {:#}", branch, anyhow::Error::from(e));
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} branches failed", failed, targets.len());
    }
    Ok(())
}

/// CLI command: list the registered backends.
///
/// Example output:
/// ```text
/// - git (default branch: master) [line_stats]
/// - github (default branch: master)
/// ```
///
/// # Errors
/// Returns an error if the configured overrides name an unknown backend.
pub fn cmd_backends(settings: &Settings) -> Result<()> {
    let registry = settings.registry()?;
    for name in registry.names() {
        let vcs = registry.resolve(name)?;
        let caps: Vec<&str> = vcs.capabilities.iter().map(Capability::as_str).collect();
        if caps.is_empty() {
            println!("- {} (default branch: {})", name, vcs.default_branch);
        } else {
            println!(
                "- {} (default branch: {}) [{}]",
                name,
                vcs.default_branch,
                caps.join(", ")
            );
        }
    }
    Ok(())
}
