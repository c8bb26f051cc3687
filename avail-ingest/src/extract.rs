//! Metadata extraction via the exiftool command-line utility
//!
//! Native parsing of embedded metadata is deliberately out of scope; the
//! pipeline shells out to exiftool per file (`exiftool -G -s -a <path>`)
//! and parses its columnar listing into a [`MetadataRecord`]. The blocking
//! subprocess call runs on the blocking pool and is the dominant per-file
//! latency in a run.
//!
//! Extraction failures are per-file, never fatal: callers turn the error
//! into a Rejected report row and keep going.

use crate::types::{MetadataRecord, Namespace};
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Extraction tool invoked when none is configured.
pub const DEFAULT_EXTRACT_COMMAND: &str = "exiftool";

/// Extraction client errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Extraction binary not found in PATH
    #[error("extraction tool not found: {0}")]
    BinaryNotFound(String),

    /// Failed to launch or wait on the extraction subprocess
    #[error("failed to execute extraction tool: {0}")]
    ExecutionError(String),

    /// Tool ran but reported failure for this file
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Client for the external metadata extraction tool.
pub struct ExiftoolClient {
    binary_path: String,
}

impl ExiftoolClient {
    /// Create a client using `exiftool` from PATH.
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_EXTRACT_COMMAND)
    }

    /// Create a client invoking a specific binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary_path: binary.into(),
        }
    }

    /// Availability probe (`exiftool -ver`). Returns false when the binary
    /// cannot be launched; the caller decides whether that is worth a
    /// warning. Extraction itself stays per-file either way.
    pub fn probe(&self) -> bool {
        match Command::new(&self.binary_path).arg("-ver").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                debug!(tool = %self.binary_path, %version, "extraction tool available");
                true
            }
            _ => false,
        }
    }

    /// Extract embedded metadata for one file.
    pub async fn extract(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        let output = tokio::task::spawn_blocking({
            let binary = self.binary_path.clone();
            let path = path.to_path_buf();

            move || {
                Command::new(&binary)
                    .arg("-G")
                    .arg("-s")
                    .arg("-a")
                    .arg(&path)
                    .output()
            }
        })
        .await
        .map_err(|e| ExtractError::ExecutionError(format!("task join error: {e}")))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExtractError::BinaryNotFound(self.binary_path.clone())
            } else {
                ExtractError::ExecutionError(e.to_string())
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::ExtractionFailed(format!(
                "exit code: {:?}, stderr: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for ExiftoolClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a full `-G -s` listing into a record.
///
/// Malformed lines contribute nothing; exiftool occasionally emits warnings
/// or truncated lines and a metadata listing is not worth crashing over.
pub fn parse_listing(listing: &str) -> MetadataRecord {
    let mut record = MetadataRecord::new();

    for line in listing.trim().lines() {
        let line = line.trim_end_matches('\r');
        match parse_line(line) {
            Some((namespace, key, value)) => record.insert(namespace, key, value),
            None => {
                if !line.trim().is_empty() {
                    debug!(%line, "skipping malformed metadata line");
                }
            }
        }
    }

    record
}

/// Split one `[Group] TagName : value` line into its parts.
///
/// Returns `None` when the line does not have the group/tag/value shape;
/// all boundary lookups are checked, so short lines cannot slice out of
/// bounds.
fn parse_line(line: &str) -> Option<(Namespace, String, String)> {
    let sep = line.find(" : ")?;
    let (head, tail) = line.split_at(sep);
    let value = tail[3..].trim();
    let head = head.trim();

    let (namespace, key) = match head.strip_prefix('[') {
        Some(stripped) => {
            let (group, after) = stripped.split_once(']')?;
            let key = after.trim();
            if key.is_empty() {
                return None;
            }
            (namespace_for_group(group), key)
        }
        None => {
            if head.is_empty() {
                return None;
            }
            (Namespace::FileInfo, head)
        }
    };

    Some((namespace, key.to_string(), value.to_string()))
}

/// Group marker to namespace. Only the three metadata standards are
/// namespaced; everything else exiftool reports is file info.
fn namespace_for_group(group: &str) -> Namespace {
    match group {
        "IPTC" => Namespace::Iptc,
        "EXIF" => Namespace::Exif,
        "XMP" => Namespace::Xmp,
        _ => Namespace::FileInfo,
    }
}
