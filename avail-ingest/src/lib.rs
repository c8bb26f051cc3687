//! avail-ingest library interface
//!
//! Scanner, extraction client, field resolution, classification, report
//! building and pipeline coordination for the AVAIL ingest readiness
//! checker.

pub mod classify;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod scanner;
pub mod stats;
pub mod types;

pub use classify::{classify, Classification, IngestStatus};
pub use extract::ExiftoolClient;
pub use pipeline::{IngestPipeline, PipelineConfig, PipelineError};
pub use resolve::ResolvedFields;
pub use scanner::{DirectoryScanner, ScanError};
pub use stats::{RunStatistics, StatsSnapshot};
pub use types::{MetadataRecord, Namespace};
