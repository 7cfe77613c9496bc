use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::env;
use tracing::debug;

use super::GitHubOptions;
use crate::actor::Identity;
use crate::commit::RawCommit;
use crate::vcs::CommitSource;

/// One entry of the commit listing.
#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetail,
    /// The linked GitHub account, absent for unknown emails.
    author: Option<ApiUser>,
    committer: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    author: ApiSignature,
    committer: ApiSignature,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiSignature {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

impl ApiCommit {
    fn into_raw(self) -> RawCommit {
        RawCommit {
            id: self.sha,
            message: self.commit.message,
            authored_at: self.commit.author.date,
            committed_at: self.commit.committer.date,
            author: identity(self.commit.author, self.author),
            committer: identity(self.commit.committer, self.committer),
            additions: None,
            deletions: None,
        }
    }
}

/// Actors are keyed by login; commits not linked to an account fall back
/// to the email recorded in the commit.
fn identity(sig: ApiSignature, user: Option<ApiUser>) -> Identity {
    let id = user.map(|u| u.login).unwrap_or_else(|| sig.email.clone());
    Identity {
        id,
        name: sig.name,
        email: sig.email,
    }
}

/// Build a blocking client with the GitHub API headers.
///
/// Adds a bearer token from `token`, or from `GITHUB_TOKEN` if that is
/// unset.
fn gh_client(token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static("metior"));

    let token = token
        .map(str::to_string)
        .or_else(|| env::var("GITHUB_TOKEN").ok());
    if let Some(tok) = token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", tok))?,
        );
    }
    let client = Client::builder().default_headers(headers).build()?;
    Ok(client)
}

/// Commit source for a repository hosted on GitHub.
#[derive(Debug, Clone)]
pub struct GitHubBackend {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    per_page: u32,
}

impl GitHubBackend {
    /// Create a backend for `location`, which must be `owner/repo`.
    ///
    /// # Errors
    /// Returns an error for a malformed location or if the HTTP client
    /// cannot be built.
    pub fn new(location: &str, options: &GitHubOptions) -> Result<Self> {
        let (owner, repo) = parse_location(location)?;
        Ok(GitHubBackend {
            client: gh_client(options.token.as_deref())?,
            api_url: options.api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            per_page: options.per_page.clamp(1, 100),
        })
    }

    fn fetch_page(&self, branch: &str, page: u32) -> Result<Vec<ApiCommit>> {
        let url = format!("{}/repos/{}/{}/commits", self.api_url, self.owner, self.repo);
        debug!(%url, branch, page, "fetching commit page");
        let commits: Vec<ApiCommit> = self
            .client
            .get(&url)
            .query(&[
                ("sha", branch.to_string()),
                ("per_page", self.per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .with_context(|| format!("GET {}", url))?
            .error_for_status()?
            .json()
            .with_context(|| format!("failed to parse commits from {}", url))?;
        Ok(commits)
    }
}

impl CommitSource for GitHubBackend {
    /// Page through the commit listing until a short page comes back.
    fn load_commits(&self, branch: &str) -> Result<Vec<RawCommit>> {
        let mut commits = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.fetch_page(branch, page)?;
            let last = batch.len() < self.per_page as usize;
            commits.extend(batch.into_iter().map(ApiCommit::into_raw));
            if last {
                break;
            }
            page += 1;
        }
        Ok(commits)
    }
}

fn parse_location(location: &str) -> Result<(&str, &str)> {
    let trimmed = location.trim();
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    match trimmed.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => bail!("expected a GitHub location like owner/repo, got {:?}", location),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use serial_test::serial;

    fn options(server: &MockServer, per_page: u32) -> GitHubOptions {
        GitHubOptions {
            api_url: server.base_url(),
            per_page,
            token: Some("secret".to_string()),
        }
    }

    fn api_commit(sha: &str, login: Option<&str>, name: &str, email: &str) -> Value {
        let sig = json!({ "name": name, "email": email, "date": "2011-03-21T10:00:00Z" });
        json!({
            "sha": sha,
            "commit": {
                "author": sig,
                "committer": { "name": "GitHub", "email": "noreply@github.com", "date": "2011-03-21T10:05:00Z" },
                "message": format!("commit {sha}\n\nbody"),
            },
            "author": login.map(|l| json!({ "login": l })),
            "committer": null,
        })
    }

    #[test]
    fn parse_location_accepts_owner_repo() {
        assert_eq!(parse_location("koraktor/metior").unwrap(), ("koraktor", "metior"));
        assert_eq!(parse_location("koraktor/metior.git").unwrap(), ("koraktor", "metior"));
    }

    #[test]
    fn parse_location_rejects_other_shapes() {
        for bad in ["metior", "/metior", "koraktor/", "a/b/c", ""] {
            assert!(parse_location(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    #[serial]
    fn load_commits_pages_until_short_page() {
        let server = MockServer::start();
        let page1 = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/koraktor/metior/commits")
                .query_param("sha", "main")
                .query_param("per_page", "2")
                .query_param("page", "1")
                .header("authorization", "Bearer secret");
            then.status(200).json_body(json!([
                api_commit("c1", Some("alice"), "Alice", "alice@example.com"),
                api_commit("c2", None, "Bob", "bob@example.com"),
            ]));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/koraktor/metior/commits")
                .query_param("page", "2");
            then.status(200).json_body(json!([
                api_commit("c3", Some("alice"), "Alice Liddell", "alice@work.example.com"),
            ]));
        });

        let backend = GitHubBackend::new("koraktor/metior", &options(&server, 2)).unwrap();
        let commits = backend.load_commits("main").unwrap();

        page1.assert();
        page2.assert();
        let ids: Vec<&str> = commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);

        assert_eq!(commits[0].author.id, "alice");
        assert_eq!(commits[1].author.id, "bob@example.com");
        assert_eq!(commits[2].author.id, "alice");
        assert_eq!(commits[2].author.name, "Alice Liddell");
        assert_eq!(commits[0].committer.id, "noreply@github.com");
        assert_eq!(commits[0].additions, None);
        assert_eq!(commits[0].authored_at.to_rfc3339(), "2011-03-21T10:00:00+00:00");
    }

    #[test]
    #[serial]
    fn error_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/koraktor/metior/commits");
            then.status(404).json_body(json!({ "message": "Not Found" }));
        });

        let backend = GitHubBackend::new("koraktor/metior", &options(&server, 100)).unwrap();
        let err = backend.load_commits("gone").unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    #[serial]
    fn repository_over_github_only_ranks_by_commit_count() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(GET).path("/repos/koraktor/metior/commits");
            then.status(200).json_body(json!([
                api_commit("c1", Some("alice"), "Alice", "alice@example.com"),
                api_commit("c2", Some("bob"), "Bob", "bob@example.com"),
                api_commit("c3", Some("alice"), "Alice", "alice@example.com"),
            ]));
        });

        let mut registry = crate::vcs::Registry::new();
        registry.register(crate::github::descriptor(options(&server, 100)));
        let repo = crate::Repository::open(&registry, "github", "koraktor/metior").unwrap();

        assert!(matches!(
            repo.significant_commits(None, 10),
            Err(crate::Error::UnsupportedOperation { .. })
        ));
        listing.assert_hits(0);

        let top = repo.top_authors(None, 3).unwrap();
        let ids: Vec<&str> = top.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        listing.assert_hits(1);
    }

    #[test]
    #[serial]
    fn token_falls_back_to_environment() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/koraktor/metior/commits")
                .header("authorization", "Bearer from-env");
            then.status(200).json_body(json!([]));
        });

        unsafe { env::set_var("GITHUB_TOKEN", "from-env") };
        let mut opts = options(&server, 100);
        opts.token = None;
        let backend = GitHubBackend::new("koraktor/metior", &opts);
        unsafe { env::remove_var("GITHUB_TOKEN") };

        assert!(backend.unwrap().load_commits("master").unwrap().is_empty());
        listing.assert();
    }
}
