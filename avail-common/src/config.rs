//! Accepted MIME type configuration
//!
//! The ingest run is scoped to a fixed set of MIME types. The set comes from
//! a YAML config file when one is supplied, otherwise from a built-in list
//! covering the common audio, image and video containers. It is constructed
//! once at startup and passed by reference into the scanner and the field
//! resolution engine.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Built-in accepted MIME types, used when no config file is given.
const DEFAULT_MIME_TYPES: &[&str] = &[
    "audio/aiff",
    "audio/basic",
    "audio/mpeg",
    "audio/ogg",
    "audio/wav",
    "audio/x-aiff",
    "audio/x-wav",
    "image/bmp",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/tiff",
    "video/mp4",
    "video/mpeg",
    "video/ogg",
    "video/quicktime",
    "video/webm",
    "video/x-msvideo",
];

/// On-disk shape of the config file:
///
/// ```yaml
/// mime_types:
///   - image/jpeg
///   - video/mp4
/// ```
#[derive(Debug, Deserialize)]
struct ConfigFile {
    mime_types: Vec<String>,
}

/// Set of MIME types accepted for ingest. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct MimeTypeSet {
    types: HashSet<String>,
}

impl MimeTypeSet {
    /// Load the accepted set from a YAML config file, or fall back to the
    /// built-in list when no path is given.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let types: Vec<String> = match config_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!(
                        "couldn't open config file {}: {e}",
                        path.display()
                    ))
                })?;
                let parsed: ConfigFile = serde_yaml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("error parsing {}: {e}", path.display()))
                })?;
                info!(
                    config = %path.display(),
                    count = parsed.mime_types.len(),
                    "Loaded accepted MIME types"
                );
                parsed.mime_types
            }
            None => {
                info!(
                    count = DEFAULT_MIME_TYPES.len(),
                    "Using built-in accepted MIME types"
                );
                DEFAULT_MIME_TYPES.iter().map(|t| t.to_string()).collect()
            }
        };

        Ok(Self {
            types: types.into_iter().collect(),
        })
    }

    /// Build a set from explicit types.
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a MIME type is accepted for ingest.
    pub fn contains(&self, mime: &str) -> bool {
        self.types.contains(mime)
    }

    /// Number of accepted types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when no types are accepted.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
