//! Directory scanner
//!
//! Walks the tree, counts every file toward Total, and forwards paths whose
//! extension maps to an accepted MIME type into the bounded path queue.
//! Runs on the blocking pool; a full queue stalls the walk, which is the
//! backpressure the pipeline relies on. Entry order is whatever the
//! traversal yields; nothing downstream depends on it.

use crate::stats::RunStatistics;
use avail_common::MimeTypeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Scanner errors. Both are fatal to the run and checked before any work
/// begins.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Root path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Recursive scanner feeding the ingest pipeline.
pub struct DirectoryScanner {
    accepted: Arc<MimeTypeSet>,
    stats: Arc<RunStatistics>,
}

impl DirectoryScanner {
    pub fn new(accepted: Arc<MimeTypeSet>, stats: Arc<RunStatistics>) -> Self {
        Self { accepted, stats }
    }

    /// Validate the root before the pipeline starts; a missing root aborts
    /// the whole run with no partial report.
    pub fn check_root(root: &Path) -> Result<(), ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        Ok(())
    }

    /// Walk the tree, emitting relevant paths into the queue. Blocks on a
    /// full queue; returns when traversal completes or the receiver is
    /// gone.
    pub fn scan(&self, root: &Path, paths: mpsc::Sender<PathBuf>) {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "error accessing entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            self.stats.record_total();

            let path = entry.into_path();
            if self.is_relevant(&path) {
                self.stats.record_relevant();
                if paths.blocking_send(path).is_err() {
                    debug!("path queue closed; stopping scan");
                    return;
                }
            }
        }
    }

    /// Extension-derived MIME type membership in the accepted set. Files
    /// with no extension or an unmapped one are silently dropped.
    fn is_relevant(&self, path: &Path) -> bool {
        mime_guess::from_path(path)
            .first_raw()
            .map(|mime| self.accepted.contains(mime))
            .unwrap_or(false)
    }
}
