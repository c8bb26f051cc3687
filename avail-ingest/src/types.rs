//! Shared types for the ingest pipeline

use std::collections::HashMap;

/// Metadata namespace a tag was reported under.
///
/// IPTC, EXIF and XMP are the three embedding standards with overlapping
/// descriptive fields; every other output group the extraction tool reports
/// (File, ExifTool, Composite, ...) lands in file info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    FileInfo,
    Iptc,
    Exif,
    Xmp,
}

/// Embedded metadata for one asset, keyed by tag name within each namespace.
///
/// All four maps are always present, possibly empty, so resolution never
/// has to deal with an absent namespace.
#[derive(Debug, Clone, Default)]
pub struct MetadataRecord {
    pub file_info: HashMap<String, String>,
    pub iptc: HashMap<String, String>,
    pub exif: HashMap<String, String>,
    pub xmp: HashMap<String, String>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag into the namespace it was reported under.
    pub fn insert(&mut self, namespace: Namespace, key: String, value: String) {
        self.map_for(namespace).insert(key, value);
    }

    fn map_for(&mut self, namespace: Namespace) -> &mut HashMap<String, String> {
        match namespace {
            Namespace::FileInfo => &mut self.file_info,
            Namespace::Iptc => &mut self.iptc,
            Namespace::Exif => &mut self.exif,
            Namespace::Xmp => &mut self.xmp,
        }
    }

    /// File-info tag value, `None` when absent or empty.
    pub fn file_info(&self, key: &str) -> Option<&str> {
        non_empty(&self.file_info, key)
    }

    /// IPTC tag value, `None` when absent or empty.
    pub fn iptc(&self, key: &str) -> Option<&str> {
        non_empty(&self.iptc, key)
    }

    /// EXIF tag value, `None` when absent or empty.
    pub fn exif(&self, key: &str) -> Option<&str> {
        non_empty(&self.exif, key)
    }

    /// XMP tag value, `None` when absent or empty.
    pub fn xmp(&self, key: &str) -> Option<&str> {
        non_empty(&self.xmp, key)
    }
}

fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key).map(String::as_str).filter(|v| !v.is_empty())
}
