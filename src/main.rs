//! # metior
//!
//! Repository history statistics from the command line.
//!
//! Features:
//! - `metior backends` lists the registered backends and their capabilities
//! - `metior authors` / `metior commits` list a branch's contributors or history
//! - `metior top-authors` ranks contributors by number of commits
//! - `metior significant-authors` / `significant-commits` rank by lines changed
//!   (only for backends with line statistics)
//!
//! Settings are read from `$(metior home)/config.toml`.
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use metior::{
    DEFAULT_AUTHOR_COUNT, DEFAULT_COMMIT_COUNT, Query, cmd_backends, cmd_query, load_config,
    load_config_from, metior_home,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Command-line interface definition.
///
/// Parsed using `clap` derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "metior",
    version,
    about = "metior - source code repository statistics",
    arg_required_else_help = true
)]
struct Cli {
    /// Read settings from this file instead of the default config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Repository and branches a query runs against.
#[derive(Args, Debug)]
struct Target {
    /// Repository location: a path for git, owner/repo for github
    location: String,

    /// Backend to use (defaults to `default_backend` from config, then git)
    #[arg(long)]
    vcs: Option<String>,

    /// Branch to analyze; repeat to analyze several in parallel
    #[arg(short, long = "branch")]
    branches: Vec<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// List registered backends
    Backends,
    /// Print the metior home directory
    Home,
    /// List every author of a branch
    Authors {
        #[command(flatten)]
        target: Target,
    },
    /// List every commit of a branch
    Commits {
        #[command(flatten)]
        target: Target,
    },
    /// Authors with the most commits
    TopAuthors {
        #[command(flatten)]
        target: Target,
        #[arg(short = 'n', long, default_value_t = DEFAULT_AUTHOR_COUNT)]
        count: usize,
    },
    /// Authors that changed the most lines
    SignificantAuthors {
        #[command(flatten)]
        target: Target,
        #[arg(short = 'n', long, default_value_t = DEFAULT_AUTHOR_COUNT)]
        count: usize,
    },
    /// Commits that changed the most lines
    SignificantCommits {
        #[command(flatten)]
        target: Target,
        #[arg(short = 'n', long, default_value_t = DEFAULT_COMMIT_COUNT)]
        count: usize,
    },
}

/// CLI entry point.
///
/// Installs the log subscriber (`RUST_LOG`, default `warn`, on stderr),
/// loads settings and executes the selected subcommand.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let (target, query) = match cli.cmd {
        Cmd::Backends => return cmd_backends(&settings),
        Cmd::Home => {
            println!("{}", metior_home()?.display());
            return Ok(());
        }
        Cmd::Authors { target } => (target, Query::Authors),
        Cmd::Commits { target } => (target, Query::Commits),
        Cmd::TopAuthors { target, count } => (target, Query::TopAuthors(count)),
        Cmd::SignificantAuthors { target, count } => (target, Query::SignificantAuthors(count)),
        Cmd::SignificantCommits { target, count } => (target, Query::SignificantCommits(count)),
    };

    cmd_query(
        &settings,
        target.vcs.as_deref(),
        &target.location,
        &target.branches,
        query,
    )
}
