// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! branchwise-git: commit sources for branchwise
//!
//! This library crate lists the branches of a repository and the commits on
//! each of them, for local working copies, generic remotes (read through a
//! TTL-bounded mirror cache) and GitHub-hosted repositories.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use branchwise_git::{CommitFilter, DateWindow, RepositorySource, SourceOptions};
//! use chrono::{Duration, Utc};
//!
//! # async fn run() -> Result<(), branchwise_git::SourceError> {
//! let now = Utc::now();
//! let window = DateWindow::new(now - Duration::days(7), now)?;
//! let options = SourceOptions::default();
//! let source = RepositorySource::resolve(".", &options).await?;
//! let branches = source
//!     .list_branch_commits(&CommitFilter::new(window), None, &options)
//!     .await?;
//!
//! for history in branches.iter() {
//!     println!("{}: {} commits", history.branch, history.commits.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod commit;
pub mod error;
pub mod hosted;
pub mod locator;
pub mod repo;
pub mod source;
#[cfg(feature = "test-utils")]
pub mod testing;

pub use cache::{CacheConfig, CacheEntry, CacheOutcome, MirrorCache};
pub use commit::{Author, Branch, BranchCommits, BranchHistory, CommitFilter, CommitRef, DateWindow};
pub use error::{SourceError, ValidationError};
pub use hosted::GitHubClient;
pub use locator::{BackendPlan, HostedRepo, Locator};
pub use repo::GitRepo;
pub use source::{RepositorySource, SourceOptions};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{BranchCommits, BranchHistory, CommitFilter, CommitRef, DateWindow};
    pub use crate::error::{SourceError, ValidationError};
    pub use crate::source::{RepositorySource, SourceOptions};
}
