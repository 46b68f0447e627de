// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! GitHub REST API backend
//!
//! Lists branches and per-branch commits without cloning. Only used when an
//! access token is available; see [`crate::Locator::plan`].

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::commit::{Author, CommitFilter, CommitRef};
use crate::error::SourceError;
use crate::locator::HostedRepo;

/// Public GitHub API root
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct ApiBranch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetail,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    author: Option<ApiSignature>,
    committer: Option<ApiSignature>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiSignature {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    date: Option<DateTime<Utc>>,
}

impl ApiCommit {
    fn into_commit_ref(self) -> CommitRef {
        let detail = self.commit;
        let timestamp = detail
            .committer
            .as_ref()
            .and_then(|c| c.date)
            .or_else(|| detail.author.as_ref().and_then(|a| a.date))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let author = detail
            .author
            .map(|a| Author::new(a.name, a.email))
            .unwrap_or_else(|| Author::new("Unknown", ""));
        CommitRef::new(self.sha, author, timestamp, detail.message)
    }
}

/// Authenticated client for one GitHub repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_base: Url,
    token: String,
    repo: HostedRepo,
}

impl GitHubClient {
    /// Create a client for `repo`
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidRepository` if `api_base` is not a URL and
    /// `SourceError::RepositoryFetch` if the HTTP client cannot be built.
    pub fn new(
        repo: HostedRepo,
        token: impl Into<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|e| SourceError::invalid(api_base, e.to_string()))?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("branchwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::fetch(api_base.as_str(), e))?;
        Ok(Self {
            http,
            api_base,
            token: token.into(),
            repo,
        })
    }

    /// The repository this client reads
    #[must_use]
    pub fn repo(&self) -> &HostedRepo {
        &self.repo
    }

    /// All branch names, in API order
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidRepository` on 404 and
    /// `SourceError::RepositoryFetch` on any other transport or status error.
    pub async fn list_branches(&self) -> Result<Vec<String>, SourceError> {
        let url = self.endpoint("branches")?;
        let branches: Vec<ApiBranch> = self.get_all_pages(url).await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    /// Commits on `branch` that pass `filter`, newest first
    ///
    /// The window is sent to the API as `since`/`until` and applied again
    /// locally; the author filter is applied locally only, since the API
    /// matches logins rather than names.
    ///
    /// # Errors
    ///
    /// Same as [`GitHubClient::list_branches`].
    pub async fn branch_commits(
        &self,
        branch: &str,
        filter: &CommitFilter,
    ) -> Result<Vec<CommitRef>, SourceError> {
        let mut url = self.endpoint("commits")?;
        url.query_pairs_mut()
            .append_pair("sha", branch)
            .append_pair("since", &iso8601(filter.window.start()))
            .append_pair("until", &iso8601(filter.window.end()));

        let commits: Vec<ApiCommit> = self.get_all_pages(url).await?;
        let total = commits.len();
        let kept: Vec<CommitRef> = commits
            .into_iter()
            .map(ApiCommit::into_commit_ref)
            .filter(|c| filter.matches(c))
            .collect();

        debug!(repo = %self.repo.slug(), branch, total, kept = kept.len(), "Listed branch commits");
        Ok(kept)
    }

    fn endpoint(&self, resource: &str) -> Result<Url, SourceError> {
        let raw = format!(
            "{}/repos/{}/{}/{}",
            self.api_base.as_str().trim_end_matches('/'),
            self.repo.owner,
            self.repo.name,
            resource
        );
        Url::parse(&raw).map_err(|e| SourceError::invalid(&self.repo.url, e.to_string()))
    }

    /// Follow `page=N` until a short page comes back
    async fn get_all_pages<T>(&self, url: Url) -> Result<Vec<T>, SourceError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut items = Vec::new();
        for page in 1.. {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<T> = self.get_json(page_url).await?;
            let len = batch.len();
            items.extend(batch);
            if len < PER_PAGE {
                break;
            }
        }
        Ok(items)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, SourceError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(url.clone())
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| SourceError::fetch(url.as_str(), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::invalid(
                &self.repo.url,
                "repository or branch not found on GitHub",
            ));
        }

        response
            .error_for_status()
            .map_err(|e| SourceError::fetch(url.as_str(), e))?
            .json::<T>()
            .await
            .map_err(|e| SourceError::fetch(url.as_str(), e))
    }
}

fn iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    #[test]
    fn test_api_commit_conversion() {
        let json = r#"{
            "sha": "1945ab9c752534e733c38ba0109dc3b741f0a6eb",
            "commit": {
                "author": {"name": "Alice", "email": "alice@example.com", "date": "2026-01-10T08:00:00Z"},
                "committer": {"name": "GitHub", "email": "noreply@github.com", "date": "2026-01-11T09:30:00Z"},
                "message": "Add widgets\n\nBody"
            }
        }"#;
        let api: ApiCommit = serde_json::from_str(json).expect("parse");
        let commit = api.into_commit_ref();
        assert_eq!(commit.id, "1945ab9c752534e733c38ba0109dc3b741f0a6eb");
        assert_eq!(commit.author, Author::new("Alice", "alice@example.com"));
        assert_eq!(
            commit.timestamp,
            Utc.with_ymd_and_hms(2026, 1, 11, 9, 30, 0).unwrap()
        );
        assert_eq!(commit.subject(), "Add widgets");
    }

    #[test]
    fn test_api_commit_missing_signatures() {
        let json = r#"{"sha": "abc", "commit": {"author": null, "committer": null, "message": "m"}}"#;
        let api: ApiCommit = serde_json::from_str(json).expect("parse");
        let commit = api.into_commit_ref();
        assert_eq!(commit.author.name, "Unknown");
        assert_eq!(commit.timestamp, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_iso8601_format() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(iso8601(ts), "2026-03-04T05:06:07Z");
    }

    #[test]
    fn test_invalid_api_base() {
        let repo = HostedRepo {
            owner: "octo".into(),
            name: "widgets".into(),
            url: "https://github.com/octo/widgets".into(),
        };
        let result = GitHubClient::new(repo, "t", "not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(SourceError::InvalidRepository { .. })));
    }
}
