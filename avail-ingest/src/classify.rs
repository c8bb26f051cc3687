//! Ingest readiness classification
//!
//! The acceptance bar: date provenance plus at least one descriptive field
//! (keywords or a description). Anything extracted but below the bar is
//! Incomplete, a normal policy outcome distinct from Rejected, which is
//! reserved for extraction failures.

use crate::resolve::ResolvedFields;
use std::fmt;

/// Reason attached to every Incomplete classification.
pub const REASON_MINIMUM_METADATA: &str = "Minimum metadata not provided";

/// Terminal status for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    Accepted,
    Incomplete,
    Rejected,
}

impl IngestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStatus::Accepted => "Accepted",
            IngestStatus::Incomplete => "Incomplete",
            IngestStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome: status plus the operator-facing reason.
#[derive(Debug, Clone)]
pub struct Classification {
    pub status: IngestStatus,
    pub reason: String,
}

impl Classification {
    /// Extraction failed; the error text becomes the reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: IngestStatus::Rejected,
            reason: reason.into(),
        }
    }
}

/// Apply the acceptance policy to resolved fields.
pub fn classify(fields: &ResolvedFields) -> Classification {
    if fields.has_date_created() && (fields.has_keywords() || fields.has_description()) {
        Classification {
            status: IngestStatus::Accepted,
            reason: String::new(),
        }
    } else {
        Classification {
            status: IngestStatus::Incomplete,
            reason: REASON_MINIMUM_METADATA.to_string(),
        }
    }
}
