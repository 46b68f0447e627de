// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! branchwise-lineage: which commits belong to which branch
//!
//! Given the filtered commit lists of every branch, this crate infers each
//! branch's most plausible parent, keeps only the commits a branch does not
//! share with that parent, and then makes sure every commit is attributed to
//! exactly one branch before grouping the result by author.

#![warn(missing_docs)]

//! # Example
//!
//! ```
//! use branchwise_git::{Author, BranchCommits, BranchHistory, CommitRef};
//! use branchwise_lineage::resolve_branches;
//! use chrono::{TimeZone, Utc};
//!
//! let commit = |id: &str| {
//!     CommitRef::new(id, Author::new("Alice", "alice@example.com"), Utc.timestamp_opt(0, 0).unwrap(), id)
//! };
//! let branches: BranchCommits = [
//!     BranchHistory::new("main", vec![commit("c"), commit("b"), commit("a")]),
//!     BranchHistory::new("feature", vec![commit("d"), commit("b"), commit("a")]),
//! ]
//! .into_iter()
//! .collect();
//!
//! let resolution = resolve_branches(&branches, "main");
//! assert_eq!(resolution.lineage.parent_of("feature"), Some("main"));
//! assert_eq!(resolution.groups.len(), 2);
//! ```

pub mod dedup;
pub mod lineage;
pub mod pipeline;
pub mod unique;

pub use dedup::{
    CommitGroup, DEFAULT_PRIMARY_BRANCH, DedupReport, SeenSet, deduplicate, deduplicate_with,
    group_by_author,
};
pub use lineage::{LineageEntry, LineageMap, infer_lineage};
pub use pipeline::{Resolution, resolve_branches};
pub use unique::{UniqueCommitSet, extract_unique};
