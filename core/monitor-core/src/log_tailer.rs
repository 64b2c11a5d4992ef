//! Reads the newest FortiusANT log in full on every poll.
//!
//! FortiusANT starts a fresh log per run, so only the most recently created
//! file matching the primary pattern is authoritative. Content is replaced
//! wholesale each time; nothing is diffed.

use fs_err as fs;
use std::path::PathBuf;

use crate::artifacts::ArtifactPattern;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSnapshot {
    pub path: Option<PathBuf>,
    pub content: String,
}

impl LogSnapshot {
    pub fn contains(&self, marker: &str) -> bool {
        self.content.contains(marker)
    }
}

#[derive(Debug, Clone)]
pub struct LogTailer {
    pattern: ArtifactPattern,
}

impl LogTailer {
    pub fn new(pattern: ArtifactPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &ArtifactPattern {
        &self.pattern
    }

    pub fn latest_log(&self) -> Option<PathBuf> {
        self.pattern.newest().map(|artifact| artifact.path)
    }

    /// Full contents of the newest log. A log that cannot be read counts as
    /// empty for this poll; the next poll tries again.
    pub fn read(&self) -> LogSnapshot {
        let Some(path) = self.latest_log() else {
            return LogSnapshot::default();
        };

        match fs::read(&path) {
            Ok(bytes) => LogSnapshot {
                content: String::from_utf8_lossy(&bytes).into_owned(),
                path: Some(path),
            },
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read log; treating as empty");
                LogSnapshot {
                    path: Some(path),
                    content: String::new(),
                }
            }
        }
    }
}
