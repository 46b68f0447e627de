// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Branch lineage inference
//!
//! A branch's parent is the other branch it shares the most commits with.
//! This is an overlap heuristic over the filtered commit sets, not a
//! merge-base computation: two branches that share no commit inside the
//! window are both treated as roots.

use std::collections::HashSet;

use branchwise_git::BranchCommits;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One branch and its inferred parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEntry {
    /// Branch name
    pub branch: String,
    /// Inferred parent, `None` for a root branch
    pub parent: Option<String>,
}

/// Branch to parent mapping, in the order the branches were listed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineageMap {
    entries: Vec<LineageEntry>,
}

impl LineageMap {
    /// Inferred parent of `branch`
    ///
    /// Returns `None` both for root branches and for unknown names; use
    /// [`LineageMap::contains`] to tell them apart.
    #[must_use]
    pub fn parent_of(&self, branch: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.branch == branch)
            .and_then(|e| e.parent.as_deref())
    }

    /// Whether `branch` is in the map
    #[must_use]
    pub fn contains(&self, branch: &str) -> bool {
        self.entries.iter().any(|e| e.branch == branch)
    }

    /// Iterate entries in branch order
    pub fn iter(&self) -> std::slice::Iter<'_, LineageEntry> {
        self.entries.iter()
    }

    /// Branches without a parent
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.parent.is_none())
            .map(|e| e.branch.as_str())
    }

    /// Number of branches
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a LineageMap {
    type Item = &'a LineageEntry;
    type IntoIter = std::slice::Iter<'a, LineageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Infer the parent of every branch
///
/// For each branch `b`, the parent is the branch `o != b` maximising
/// `|S(b) ∩ S(o)|` where `S` is the set of commit ids, provided the overlap
/// is non-zero. Ties go to the branch listed first.
///
/// `primary` is always a root. A candidate whose own inferred ancestry
/// already leads back to `b` is skipped, so the result never contains a
/// cycle and two branches never claim each other as parent.
#[must_use]
pub fn infer_lineage(branches: &BranchCommits, primary: &str) -> LineageMap {
    let sets: Vec<(&str, HashSet<&str>)> = branches
        .iter()
        .map(|h| (h.branch.as_str(), h.ids().collect()))
        .collect();

    // Parents decided so far, by index into `sets`
    let mut parents: Vec<Option<usize>> = vec![None; sets.len()];

    for (i, (branch, ids)) in sets.iter().enumerate() {
        if *branch == primary {
            debug!(branch, "Primary branch is a root");
            continue;
        }

        let mut best: Option<(usize, usize)> = None;
        for (j, (_, other_ids)) in sets.iter().enumerate() {
            if i == j || leads_back_to(&parents, j, i) {
                continue;
            }
            let overlap = ids.intersection(other_ids).count();
            if overlap > best.map_or(0, |(_, n)| n) {
                best = Some((j, overlap));
            }
        }

        match best {
            Some((j, overlap)) => {
                debug!(branch, parent = sets[j].0, overlap, "Inferred parent branch");
                parents[i] = Some(j);
            }
            None => debug!(branch, "No overlapping branch, treating as root"),
        }
    }

    let entries = sets
        .iter()
        .zip(parents)
        .map(|((branch, _), parent)| LineageEntry {
            branch: (*branch).to_string(),
            parent: parent.map(|j| sets[j].0.to_string()),
        })
        .collect();

    LineageMap { entries }
}

/// Whether following decided parents from `from` reaches `target`
fn leads_back_to(parents: &[Option<usize>], from: usize, target: usize) -> bool {
    let mut current = Some(from);
    // Parents form a forest, so the walk ends within `parents.len()` steps
    for _ in 0..=parents.len() {
        match current {
            Some(node) if node == target => return true,
            Some(node) => current = parents[node],
            None => return false,
        }
    }
    false
}
