// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Unique commit extraction
//!
//! A branch keeps the commits its inferred parent does not have. Matching is
//! by commit id only, so a cherry-pick is a different commit.

use std::collections::HashSet;

use branchwise_git::{BranchCommits, BranchHistory, CommitRef};
use serde::Serialize;
use tracing::debug;

use crate::lineage::LineageMap;

/// Per-branch commits not shared with the branch's parent, in branch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UniqueCommitSet {
    branches: Vec<BranchHistory>,
}

impl UniqueCommitSet {
    /// Commits kept for `branch`
    #[must_use]
    pub fn get(&self, branch: &str) -> Option<&[CommitRef]> {
        self.branches
            .iter()
            .find(|h| h.branch == branch)
            .map(|h| h.commits.as_slice())
    }

    /// Iterate branches in order
    pub fn iter(&self) -> std::slice::Iter<'_, BranchHistory> {
        self.branches.iter()
    }

    /// Number of branches
    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Whether there are no branches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Total commits kept across all branches
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.branches.iter().map(|h| h.commits.len()).sum()
    }
}

impl<'a> IntoIterator for &'a UniqueCommitSet {
    type Item = &'a BranchHistory;
    type IntoIter = std::slice::Iter<'a, BranchHistory>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Keep, for each branch, the commits absent from its parent
///
/// Branches without a parent (or not in `lineage`) keep every commit.
/// Relative order within a branch is preserved.
#[must_use]
pub fn extract_unique(branches: &BranchCommits, lineage: &LineageMap) -> UniqueCommitSet {
    let unique = branches
        .iter()
        .map(|history| {
            let parent_ids: HashSet<&str> = lineage
                .parent_of(&history.branch)
                .and_then(|parent| branches.get(parent))
                .map(|parent| parent.ids().collect())
                .unwrap_or_default();

            let commits: Vec<CommitRef> = history
                .commits
                .iter()
                .filter(|c| !parent_ids.contains(c.id.as_str()))
                .cloned()
                .collect();

            debug!(
                branch = %history.branch,
                total = history.commits.len(),
                unique = commits.len(),
                "Extracted unique commits"
            );
            BranchHistory::new(history.branch.clone(), commits)
        })
        .collect();

    UniqueCommitSet { branches: unique }
}
