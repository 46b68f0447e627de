// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository locator classification
//!
//! A locator is whatever the user typed to name a repository. Classification
//! looks only at the string: GitHub URLs go to the hosted API backend,
//! other URL-like strings are generic remotes, everything else is a path.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{SourceError, ValidationError};

const GITHUB_PREFIXES: [&str; 3] = ["https://github.com/", "http://github.com/", "git@github.com:"];
const GITLAB_PREFIXES: [&str; 3] = ["https://gitlab.com/", "http://gitlab.com/", "git@gitlab.com:"];
const REMOTE_PREFIXES: [&str; 6] = ["https://", "http://", "git@", "ssh://", "git://", "file://"];

/// A repository on GitHub, addressed as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRepo {
    /// Account or organisation
    pub owner: String,
    /// Repository name, without a `.git` suffix
    pub name: String,
    /// The locator as given
    pub url: String,
}

impl HostedRepo {
    /// `owner/name`
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Canonical clone URL, keeping SSH for SSH locators
    ///
    /// Extra path segments in the given URL (`/tree/main`, `/pulls`, ...)
    /// are dropped.
    #[must_use]
    pub fn clone_url(&self) -> String {
        if self.url.starts_with("git@") {
            format!("git@github.com:{}/{}.git", self.owner, self.name)
        } else {
            format!("https://github.com/{}/{}.git", self.owner, self.name)
        }
    }
}

/// Classified repository locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// GitHub repository, readable through the REST API
    Hosted(HostedRepo),
    /// Any other remote, read through the mirror cache
    Remote(String),
    /// Repository on the local filesystem
    Local(PathBuf),
}

/// How a locator will actually be read once credentials are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendPlan {
    /// Open the path directly
    Local(PathBuf),
    /// Mirror the URL into the cache, then open the mirror
    Mirror(String),
    /// Query the hosting API
    Hosted(HostedRepo),
}

impl Locator {
    /// Classify a locator string
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyLocator` for blank input and
    /// `SourceError::InvalidRepository` for a GitHub URL without an
    /// `owner/name` path.
    pub fn classify(locator: &str) -> Result<Self, SourceError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(ValidationError::EmptyLocator.into());
        }

        if let Some(rest) = strip_any_prefix(locator, &GITHUB_PREFIXES) {
            return parse_owner_repo(rest)
                .map(|(owner, name)| {
                    Self::Hosted(HostedRepo {
                        owner,
                        name,
                        url: locator.to_string(),
                    })
                })
                .ok_or_else(|| SourceError::invalid(locator, "expected a github.com/<owner>/<repo> URL"));
        }

        if strip_any_prefix(locator, &GITLAB_PREFIXES).is_some() {
            debug!(locator, "GitLab has no API backend, reading as a generic remote");
            return Ok(Self::Remote(locator.to_string()));
        }

        if strip_any_prefix(locator, &REMOTE_PREFIXES).is_some() {
            return Ok(Self::Remote(locator.to_string()));
        }

        Ok(Self::Local(PathBuf::from(locator)))
    }

    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hosted(_) => "hosted",
            Self::Remote(_) => "remote",
            Self::Local(_) => "local",
        }
    }

    /// Choose the backend given the available token
    ///
    /// A hosted locator without a token falls back to mirroring it as a
    /// generic remote.
    #[must_use]
    pub fn plan(self, token: Option<&str>) -> BackendPlan {
        match self {
            Self::Hosted(repo) if token.is_some_and(|t| !t.trim().is_empty()) => {
                BackendPlan::Hosted(repo)
            }
            Self::Hosted(repo) => {
                warn!(
                    repo = %repo.slug(),
                    "No GitHub access token configured, falling back to cloning the repository"
                );
                BackendPlan::Mirror(repo.clone_url())
            }
            Self::Remote(url) => BackendPlan::Mirror(url),
            Self::Local(path) => BackendPlan::Local(path),
        }
    }
}

fn strip_any_prefix<'a>(value: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| value.strip_prefix(prefix))
}

/// Split `owner/repo[.git][/...]` into its two leading segments
fn parse_owner_repo(path: &str) -> Option<(String, String)> {
    let mut segments = path.split('/');
    let owner = segments.next()?.trim();
    let name = segments.next()?.trim();
    let name = name.strip_suffix(".git").unwrap_or(name);
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}
