// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Local mirror cache for remote repositories
//!
//! Each remote gets a directory under the cache root named after the last
//! segment of its URL. The directory holds a bare clone in `repo.git`. The
//! directory's modification time is the clone time: fetches only write
//! inside `repo.git`, so refreshing a mirror does not extend its lifetime.
//!
//! ```text
//! <root>/
//!   widgets.lock        advisory lock, held during ensure
//!   widgets/
//!     repo.git/         bare clone, branches mirrored into refs/heads
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use git2::build::RepoBuilder;
use git2::{AutotagOption, Cred, CredentialType, FetchOptions, FetchPrune, RemoteCallbacks, Repository};
use tracing::{debug, info, warn};

use crate::error::SourceError;

/// Default time a mirror is reused before it is recloned
pub const DEFAULT_TTL_DAYS: u64 = 7;

/// Name of the bare repository inside a cache entry directory
const MIRROR_DIR: &str = "repo.git";

/// Refspecs fetched into every mirror
const MIRROR_REFSPECS: [&str; 2] = ["+refs/heads/*:refs/heads/*", "+refs/tags/*:refs/tags/*"];

/// libgit2's "fetch everything" depth, used to deepen a shallow clone
const UNSHALLOW_DEPTH: i32 = i32::MAX;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Where mirrors live and how long they stay valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding one subdirectory per mirrored remote
    pub root: PathBuf,
    /// Maximum mirror age before it is recloned
    pub ttl: Duration,
    /// Start with a depth-1 clone and deepen it during the first fetch
    pub shallow: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
            ttl: Duration::from_secs(DEFAULT_TTL_DAYS * SECS_PER_DAY),
            shallow: true,
        }
    }
}

impl CacheConfig {
    /// Cache under `root` with the default TTL
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Set the TTL in whole days
    #[must_use]
    pub fn with_ttl_days(mut self, days: u64) -> Self {
        self.ttl = Duration::from_secs(days.saturating_mul(SECS_PER_DAY));
        self
    }

    /// Set the TTL
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable the shallow initial clone
    ///
    /// `file://` remotes are always cloned in full, since libgit2's local
    /// transport cannot serve shallow fetches.
    #[must_use]
    pub fn with_shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }
}

/// Platform cache directory for mirrors
///
/// - Linux: ~/.cache/branchwise/repos
/// - macOS: ~/Library/Caches/branchwise/repos
/// - Windows: %LOCALAPPDATA%\branchwise\repos
#[must_use]
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("branchwise")
        .join("repos")
}

/// What `ensure` had to do to produce the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Existing mirror was young enough and was fetched into
    Hit,
    /// No mirror existed; it was cloned
    Miss,
    /// The mirror was too old; it was removed and cloned again
    Expired,
}

/// A usable mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The remote the mirror was made from
    pub repo_locator: String,
    /// Path of the bare repository, suitable for [`crate::GitRepo::open`]
    pub local_path: PathBuf,
    /// When the last fetch completed
    pub fetched_at: DateTime<Utc>,
    /// TTL the entry was checked against
    pub ttl: Duration,
    /// Whether the mirror was reused or cloned
    pub outcome: CacheOutcome,
}

/// Maintains mirrors of remote repositories under a cache root
#[derive(Debug, Clone, Default)]
pub struct MirrorCache {
    config: CacheConfig,
}

impl MirrorCache {
    /// Create a cache manager
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Directory a remote is mirrored into, if a cache key can be derived
    #[must_use]
    pub fn entry_dir(&self, remote_url: &str) -> Option<PathBuf> {
        cache_key(remote_url).map(|key| self.key_dir(&key))
    }

    fn key_dir(&self, key: &str) -> PathBuf {
        self.config.root.join(key)
    }

    /// Return an up-to-date mirror of `remote_url`, cloning if needed
    ///
    /// # Errors
    ///
    /// See [`MirrorCache::ensure_at`].
    pub fn ensure_local_mirror(&self, remote_url: &str) -> Result<CacheEntry, SourceError> {
        self.ensure_at(remote_url, SystemTime::now())
    }

    /// Like [`MirrorCache::ensure_local_mirror`] with an explicit clock
    ///
    /// A mirror whose age is below the TTL is reused; otherwise it is removed
    /// and cloned again. Either way all branches and tags are fetched before
    /// returning.
    ///
    /// # Errors
    ///
    /// - `SourceError::InvalidRepository` if no cache key can be derived
    /// - `SourceError::RepositoryFetch` if cloning or fetching fails
    /// - `SourceError::Io` if the cache directory cannot be created or removed
    pub fn ensure_at(&self, remote_url: &str, now: SystemTime) -> Result<CacheEntry, SourceError> {
        let key = cache_key(remote_url)
            .ok_or_else(|| SourceError::invalid(remote_url, "cannot derive a cache key"))?;
        fs::create_dir_all(&self.config.root)?;
        let _lock = CacheLock::acquire(&self.config.root.join(format!("{key}.lock")))?;

        let entry_dir = self.key_dir(&key);
        let mirror_path = entry_dir.join(MIRROR_DIR);

        let outcome = if entry_dir.exists() {
            let age = mirror_age(&entry_dir, now)?;
            if age < self.config.ttl && mirror_path.exists() {
                debug!(key = %key, age_secs = age.as_secs(), "Reusing cached mirror");
                CacheOutcome::Hit
            } else {
                info!(key = %key, age_secs = age.as_secs(), "Cached mirror expired, recloning");
                fs::remove_dir_all(&entry_dir)?;
                CacheOutcome::Expired
            }
        } else {
            CacheOutcome::Miss
        };

        if outcome != CacheOutcome::Hit {
            self.clone_mirror(remote_url, &entry_dir, &mirror_path)?;
        }
        self.fetch_all(remote_url, &mirror_path)?;

        Ok(CacheEntry {
            repo_locator: remote_url.to_string(),
            local_path: mirror_path,
            fetched_at: Utc::now(),
            ttl: self.config.ttl,
            outcome,
        })
    }

    /// Bare clone into `mirror_path`; the entry directory is removed on failure
    fn clone_mirror(
        &self,
        remote_url: &str,
        entry_dir: &Path,
        mirror_path: &Path,
    ) -> Result<(), SourceError> {
        let shallow = self.config.shallow && !remote_url.starts_with("file://");
        info!(url = remote_url, path = %mirror_path.display(), shallow, "Cloning mirror");
        fs::create_dir_all(entry_dir)?;

        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(remote_callbacks());
        if shallow {
            fetch.depth(1);
        }

        let result = RepoBuilder::new()
            .bare(true)
            .fetch_options(fetch)
            .clone(remote_url, mirror_path);

        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_dir_all(entry_dir) {
                warn!(path = %entry_dir.display(), error = %cleanup, "Failed to remove partial mirror");
            }
            return Err(SourceError::fetch(remote_url, e));
        }
        Ok(())
    }

    /// Fetch every branch and tag of the remote into the mirror's local refs
    fn fetch_all(&self, remote_url: &str, mirror_path: &Path) -> Result<(), SourceError> {
        let repo = Repository::open_bare(mirror_path).map_err(|e| SourceError::fetch(remote_url, e))?;
        let mut remote = repo
            .remote_anonymous(remote_url)
            .map_err(|e| SourceError::fetch(remote_url, e))?;

        let mut fetch = FetchOptions::new();
        fetch
            .remote_callbacks(remote_callbacks())
            .download_tags(AutotagOption::All)
            .prune(FetchPrune::On);
        if repo.is_shallow() {
            fetch.depth(UNSHALLOW_DEPTH);
        }

        remote
            .fetch(&MIRROR_REFSPECS, Some(&mut fetch), None)
            .map_err(|e| SourceError::fetch(remote_url, e))?;

        let stats = remote.stats();
        debug!(
            url = remote_url,
            objects = stats.received_objects(),
            bytes = stats.received_bytes(),
            "Fetched remote"
        );
        Ok(())
    }
}

/// Cache key for a remote URL: its last path segment without `.git`
///
/// scp-like URLs (`git@host:team/repo.git`) split on `:` when there is no `/`.
#[must_use]
pub fn cache_key(remote_url: &str) -> Option<String> {
    let trimmed = remote_url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit(['/', ':']).next()?;
    let segment = segment.strip_suffix(".git").unwrap_or(segment);
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

fn mirror_age(entry_dir: &Path, now: SystemTime) -> Result<Duration, SourceError> {
    let modified = fs::metadata(entry_dir)?.modified()?;
    Ok(now.duration_since(modified).unwrap_or(Duration::ZERO))
}

/// Credentials for mirror transfers: SSH agent for ssh remotes, the
/// platform default otherwise
fn remote_callbacks() -> RemoteCallbacks<'static> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed| {
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        Cred::default()
    });
    callbacks
}

/// Exclusive advisory lock on a per-key lock file, released on drop
struct CacheLock {
    file: File,
}

impl CacheLock {
    fn acquire(path: &Path) -> Result<Self, SourceError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
