// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for branchwise-git

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Boxed transport error carried by [`SourceError::RepositoryFetch`]
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Input rejected before any I/O happens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The date window starts after it ends
    #[error("Start date {start} cannot be after end date {end}")]
    InvalidWindow {
        /// Requested window start
        start: DateTime<Utc>,
        /// Requested window end
        end: DateTime<Utc>,
    },

    /// No repository path or URL was given
    #[error("Repository path or URL is required")]
    EmptyLocator,
}

/// Errors that can occur while reading branches and commits
#[derive(Debug, Error)]
pub enum SourceError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// The locator does not resolve to a usable repository
    #[error("Invalid repository {locator}: {reason}")]
    InvalidRepository {
        /// The path or URL that was given
        locator: String,
        /// Why it was rejected
        reason: String,
    },

    /// Clone, fetch or API transfer failed
    #[error("Failed to fetch {url}: {source}")]
    RepositoryFetch {
        /// The remote being contacted
        url: String,
        /// Underlying transport error
        #[source]
        source: TransportError,
    },

    /// Malformed input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Cache directory I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A branch worker panicked or was cancelled
    #[error("Branch worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl SourceError {
    /// Build a [`SourceError::RepositoryFetch`] from any transport error
    pub fn fetch(url: impl Into<String>, source: impl Into<TransportError>) -> Self {
        Self::RepositoryFetch {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Build a [`SourceError::InvalidRepository`]
    pub fn invalid(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRepository {
            locator: locator.into(),
            reason: reason.into(),
        }
    }
}
