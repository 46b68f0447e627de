// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Backend selection and per-branch commit listing
//!
//! [`RepositorySource`] is chosen once from the classified locator. Listing
//! runs one task per branch on a bounded pool, each with a timeout, and
//! reassembles the results in the backend's branch order.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::cache::{CacheConfig, CacheEntry, MirrorCache};
use crate::commit::{BranchCommits, BranchHistory, CommitFilter, CommitRef};
use crate::error::SourceError;
use crate::hosted::{DEFAULT_API_BASE, GitHubClient};
use crate::locator::{BackendPlan, Locator};
use crate::repo::GitRepo;

/// Default number of branches listed concurrently
pub const DEFAULT_WORKERS: usize = 4;

/// Default per-branch and per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials, cache and pool settings for reading a repository
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// GitHub access token; without one GitHub URLs are cloned instead
    pub token: Option<String>,
    /// Mirror cache settings for remote repositories
    pub cache: CacheConfig,
    /// Maximum branches listed at once
    pub workers: usize,
    /// Timeout applied to each branch listing
    pub timeout: Duration,
    /// GitHub API root
    pub api_base: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            token: None,
            cache: CacheConfig::default(),
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl SourceOptions {
    /// Set the access token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the cache configuration
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the worker count (at least one worker always runs)
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-branch timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the GitHub API root
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// A repository ready to be read
#[derive(Debug, Clone)]
pub enum RepositorySource {
    /// Repository on disk
    Local(PathBuf),
    /// Cached mirror of a remote
    Mirror(CacheEntry),
    /// GitHub API
    Hosted(GitHubClient),
}

impl RepositorySource {
    /// Classify `locator`, pick a backend and prepare it
    ///
    /// For remotes this clones or refreshes the mirror. Local paths are
    /// checked to be repositories.
    ///
    /// # Errors
    ///
    /// - `SourceError::Validation` for an empty locator
    /// - `SourceError::InvalidRepository` if a local path is not a repository
    /// - `SourceError::RepositoryFetch` if the mirror cannot be cloned or fetched
    pub async fn resolve(locator: &str, options: &SourceOptions) -> Result<Self, SourceError> {
        let classified = Locator::classify(locator)?;
        let kind = classified.kind();
        let plan = classified.plan(options.token.as_deref());
        info!(locator, kind, "Resolved repository locator");
        Self::prepare(plan, options).await
    }

    /// Prepare an already chosen backend
    ///
    /// # Errors
    ///
    /// See [`RepositorySource::resolve`].
    pub async fn prepare(plan: BackendPlan, options: &SourceOptions) -> Result<Self, SourceError> {
        match plan {
            BackendPlan::Local(path) => {
                let check = path.clone();
                tokio::task::spawn_blocking(move || GitRepo::open(&check).map(|_| ())).await??;
                Ok(Self::Local(path))
            }
            BackendPlan::Mirror(url) => {
                let cache = MirrorCache::new(options.cache.clone());
                let entry =
                    tokio::task::spawn_blocking(move || cache.ensure_local_mirror(&url)).await??;
                info!(
                    url = %entry.repo_locator,
                    path = %entry.local_path.display(),
                    outcome = ?entry.outcome,
                    "Mirror ready"
                );
                Ok(Self::Mirror(entry))
            }
            BackendPlan::Hosted(repo) => {
                let token = options.token.clone().unwrap_or_default();
                let client = GitHubClient::new(repo, token, &options.api_base, options.timeout)?;
                Ok(Self::Hosted(client))
            }
        }
    }

    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Mirror(_) => "mirror",
            Self::Hosted(_) => "hosted",
        }
    }

    /// Path of the repository read by the git backends
    fn repo_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Local(path) => Some(path),
            Self::Mirror(entry) => Some(&entry.local_path),
            Self::Hosted(_) => None,
        }
    }

    /// Human-readable name of what is being read, for errors
    fn describe(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Mirror(entry) => entry.repo_locator.clone(),
            Self::Hosted(client) => client.repo().url.clone(),
        }
    }

    /// Branch names in backend order
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the branch list cannot be read.
    pub async fn list_branches(&self) -> Result<Vec<String>, SourceError> {
        match self {
            Self::Hosted(client) => client.list_branches().await,
            _ => {
                let path = self.repo_path().cloned().unwrap_or_default();
                tokio::task::spawn_blocking(move || -> Result<Vec<String>, SourceError> {
                    let repo = GitRepo::open(&path)?;
                    Ok(repo
                        .list_branches()?
                        .into_iter()
                        .inspect(|b| debug!(branch = %b.name, head = b.head.short_id(), "Found branch"))
                        .map(|b| b.name)
                        .collect())
                })
                .await?
            }
        }
    }

    /// Filtered commits of one branch, newest first
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the branch cannot be read.
    pub async fn branch_commits(
        &self,
        branch: &str,
        filter: &CommitFilter,
    ) -> Result<Vec<CommitRef>, SourceError> {
        match self {
            Self::Hosted(client) => client.branch_commits(branch, filter).await,
            _ => {
                let path = self.repo_path().cloned().unwrap_or_default();
                let branch = branch.to_string();
                let filter = filter.clone();
                tokio::task::spawn_blocking(move || {
                    GitRepo::open(&path)?.branch_commits(&branch, &filter)
                })
                .await?
            }
        }
    }

    /// Filtered commits of every branch (or only `only_branch`)
    ///
    /// Branches are listed on a pool of `options.workers` tasks, each bounded
    /// by `options.timeout`. The first failure aborts the remaining tasks.
    ///
    /// # Errors
    ///
    /// - `SourceError::InvalidRepository` if `only_branch` does not exist
    /// - `SourceError::RepositoryFetch` if a branch listing times out
    /// - any error from [`RepositorySource::branch_commits`]
    pub async fn list_branch_commits(
        &self,
        filter: &CommitFilter,
        only_branch: Option<&str>,
        options: &SourceOptions,
    ) -> Result<BranchCommits, SourceError> {
        let mut names = self.list_branches().await?;
        if let Some(wanted) = only_branch {
            names.retain(|name| name == wanted);
            if names.is_empty() {
                return Err(SourceError::invalid(
                    self.describe(),
                    format!("branch '{wanted}' not found"),
                ));
            }
        }

        let workers = options.workers.max(1);
        info!(
            source = self.kind(),
            branches = names.len(),
            workers,
            "Listing branch commits"
        );

        let source = Arc::new(self.clone());
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for (index, name) in names.iter().enumerate() {
            let source = Arc::clone(&source);
            let semaphore = Arc::clone(&semaphore);
            let filter = filter.clone();
            let name = name.clone();
            let timeout = options.timeout;
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result =
                    tokio::time::timeout(timeout, source.branch_commits(&name, &filter)).await;
                (index, name, result)
            });
        }

        let mut slots: Vec<Option<BranchHistory>> = vec![None; names.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, name, result) = joined?;
            let commits = match result {
                Ok(commits) => commits?,
                Err(elapsed) => return Err(SourceError::fetch(self.describe(), elapsed)),
            };
            debug!(branch = %name, commits = commits.len(), "Branch listed");
            slots[index] = Some(BranchHistory::new(name, commits));
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
