//! Pattern-matched files in a single directory: listing, draining, trimming.
//!
//! Used for the FortiusANT logs (read while monitoring, deleted on shutdown)
//! and for the desktop trash, which is trimmed down to a few recent entries.
//! Every delete tolerates the entry having already disappeared.

use fs_err as fs;
use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{MonitorError, Result};

/// Extra re-listings allowed while draining, on top of the initial count.
pub const CLEANUP_PASS_SLACK: usize = 8;

/// A file (or directory) matching an [`ArtifactPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub created: SystemTime,
}

/// Outcome of deleting one artifact.
#[derive(Debug)]
pub enum Removal {
    Removed,
    /// Someone else got there first; counts as done.
    Vanished,
    Failed(io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub removed: usize,
    pub vanished: usize,
    pub failed: usize,
    /// Number of listings taken (drain) or deletions attempted (trim).
    pub passes: usize,
    /// Gave up at the iteration cap with work remaining.
    pub exhausted: bool,
}

impl CleanupOutcome {
    fn record(&mut self, removal: &Removal) {
        match removal {
            Removal::Removed => self.removed += 1,
            Removal::Vanished => self.vanished += 1,
            Removal::Failed(_) => self.failed += 1,
        }
    }
}

/// A glob over the file names of one directory (non-recursive).
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
    dir: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
}

impl ArtifactPattern {
    pub fn new(dir: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| MonitorError::InvalidPattern {
                pattern: pattern.to_string(),
                details: err.to_string(),
            })?;
        Ok(Self {
            dir: dir.into(),
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Current matches, oldest first. A missing or unreadable directory
    /// yields an empty listing.
    pub fn list(&self) -> Vec<Artifact> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        error = %err,
                        dir = %self.dir.display(),
                        "Failed to list directory"
                    );
                }
                return Vec::new();
            }
        };

        let mut artifacts = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| self.matches(&entry.file_name()))
            .filter_map(|entry| {
                // Entries removed between listing and stat are simply skipped.
                let metadata = entry.metadata().ok()?;
                let created = metadata
                    .created()
                    .or_else(|_| metadata.modified())
                    .unwrap_or(UNIX_EPOCH);
                Some(Artifact {
                    path: entry.path(),
                    created,
                })
            })
            .collect::<Vec<_>>();
        artifacts.sort_by(|left, right| {
            left.created
                .cmp(&right.created)
                .then_with(|| left.path.cmp(&right.path))
        });
        artifacts
    }

    /// Shell glob semantics: a leading dot must be matched literally, so
    /// hidden entries only match patterns that themselves start with `.`.
    fn matches(&self, name: &std::ffi::OsStr) -> bool {
        let hidden = name.to_string_lossy().starts_with('.');
        if hidden && !self.pattern.starts_with('.') {
            return false;
        }
        self.matcher.is_match(name)
    }

    pub fn newest(&self) -> Option<Artifact> {
        self.list().pop()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Deletes matches until a fresh listing comes back empty, so files
    /// created while deleting are caught too. Re-listing is capped at the
    /// initial match count plus [`CLEANUP_PASS_SLACK`].
    pub fn drain(&self) -> CleanupOutcome {
        self.drain_with(|_| {})
    }

    /// [`drain`](Self::drain) with a hook run after each pass, before the
    /// directory is listed again.
    fn drain_with(&self, mut after_pass: impl FnMut(usize)) -> CleanupOutcome {
        let mut outcome = CleanupOutcome::default();
        let mut listing = self.list();
        let max_passes = listing.len() + CLEANUP_PASS_SLACK;

        while !listing.is_empty() {
            if outcome.passes >= max_passes {
                outcome.exhausted = true;
                tracing::warn!(
                    dir = %self.dir.display(),
                    pattern = %self.pattern,
                    remaining = listing.len(),
                    "Giving up draining; files keep appearing"
                );
                break;
            }
            outcome.passes += 1;

            let mut progressed = false;
            for artifact in listing.iter().rev() {
                let removal = remove_artifact(&artifact.path);
                progressed |= !matches!(removal, Removal::Failed(_));
                outcome.record(&removal);
            }
            if !progressed {
                // Nothing in this listing can be removed; more passes won't help.
                outcome.exhausted = true;
                break;
            }
            after_pass(outcome.passes);
            listing = self.list();
        }

        outcome
    }

    /// Deletes the oldest match until at most `retain` remain. Never
    /// deletes below `retain`; a listing already at or under it is left
    /// alone. Deletions are capped at the initial match count.
    pub fn trim_to(&self, retain: usize) -> CleanupOutcome {
        let mut outcome = CleanupOutcome::default();
        let mut stuck: HashSet<PathBuf> = HashSet::new();
        let mut listing = self.list();
        let max_deletions = listing.len();

        while listing.len() > retain {
            // Entries that failed to delete stay counted but are not retried.
            let Some(oldest) = listing.iter().find(|artifact| !stuck.contains(&artifact.path))
            else {
                outcome.exhausted = true;
                break;
            };
            if outcome.passes >= max_deletions {
                outcome.exhausted = true;
                tracing::warn!(
                    dir = %self.dir.display(),
                    remaining = listing.len(),
                    retain,
                    "Giving up trimming; entries keep appearing"
                );
                break;
            }
            outcome.passes += 1;

            let removal = remove_artifact(&oldest.path);
            if matches!(removal, Removal::Failed(_)) {
                stuck.insert(oldest.path.clone());
            }
            outcome.record(&removal);
            listing = self.list();
        }

        outcome
    }
}

/// Removes a file or directory, treating "already gone" as success.
pub fn remove_artifact(path: &Path) -> Removal {
    let result = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed");
            Removal::Removed
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Already removed");
            Removal::Vanished
        }
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove");
            Removal::Failed(err)
        }
    }
}
