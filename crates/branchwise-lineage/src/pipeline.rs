// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Lineage, unique extraction and deduplication in one call

use branchwise_git::BranchCommits;
use serde::Serialize;
use tracing::info;

use crate::dedup::{CommitGroup, DedupReport, SeenSet, deduplicate_with, group_by_author};
use crate::lineage::{LineageMap, infer_lineage};
use crate::unique::{UniqueCommitSet, extract_unique};

/// Everything produced for one set of branch commit lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Inferred parent of every branch
    pub lineage: LineageMap,
    /// Commits each branch does not share with its parent
    pub unique: UniqueCommitSet,
    /// Deduplicated author groups
    pub groups: Vec<CommitGroup>,
    /// What deduplication removed
    pub report: DedupReport,
}

/// Resolve which commits belong to which branch
///
/// `branches` must already be filtered to the date window and author, and
/// be in the backend's branch order.
#[must_use]
pub fn resolve_branches(branches: &BranchCommits, primary: &str) -> Resolution {
    let lineage = infer_lineage(branches, primary);
    let unique = extract_unique(branches, &lineage);
    let (groups, report) = deduplicate_with(group_by_author(&unique), primary, &mut SeenSet::new());

    info!(
        branches = branches.len(),
        roots = lineage.roots().count(),
        unique_commits = unique.commit_count(),
        groups = groups.len(),
        duplicates_removed = report.total(),
        "Resolved branch commits"
    );

    Resolution {
        lineage,
        unique,
        groups,
        report,
    }
}
