//! Concurrent ingest pipeline
//!
//! One producer (the directory scanner) feeds a bounded path queue; a pool
//! of interchangeable workers runs extraction → resolution →
//! classification → row building per path; a single writer drains a
//! bounded result queue into the CSV report. Bounded queues cap memory and
//! give natural backpressure: a slow writer stalls workers, which stalls
//! the scanner.
//!
//! Every path read from the path queue yields exactly one row on the
//! result queue: per-file failures become Rejected rows, never missing
//! ones. Row order is whatever worker completion order produces;
//! extraction latency varies too much per file for ordering to be worth
//! preserving.
//!
//! Termination: the scanner closes the path queue when traversal
//! completes; the worker stage finishing (the completion barrier) closes
//! the result queue; the run is done once the writer has drained and
//! flushed. There is no cancellation of an in-flight run, so a wedged
//! extraction subprocess blocks its worker indefinitely.

use crate::classify::{classify, Classification, IngestStatus};
use crate::extract::{ExiftoolClient, DEFAULT_EXTRACT_COMMAND};
use crate::report;
use crate::resolve::ResolvedFields;
use crate::scanner::{DirectoryScanner, ScanError};
use crate::stats::{RunStatistics, StatsSnapshot};
use avail_common::MimeTypeSet;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

/// Capacity of the path and result queues.
const QUEUE_CAPACITY: usize = 64;

/// Pipeline errors. Anything here aborts the run; per-file trouble never
/// surfaces this way.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("error writing report: {0}")]
    Report(#[from] csv::Error),

    #[error("pipeline task failed: {0}")]
    TaskJoin(String),
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of parallel extraction workers.
    pub workers: usize,
    /// Extraction command invoked per file.
    pub extract_command: String,
    /// Log every per-file failure while processing.
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            extract_command: DEFAULT_EXTRACT_COMMAND.to_string(),
            verbose: false,
        }
    }
}

/// Coordinator for one ingest run.
pub struct IngestPipeline {
    config: PipelineConfig,
    accepted: Arc<MimeTypeSet>,
}

impl IngestPipeline {
    pub fn new(config: PipelineConfig, accepted: MimeTypeSet) -> Self {
        Self {
            config,
            accepted: Arc::new(accepted),
        }
    }

    /// Run the full pipeline over `root`, writing the report to `out`.
    /// Returns the final statistics once the writer has drained and
    /// flushed the result queue.
    pub async fn run(
        &self,
        root: &Path,
        out: Box<dyn Write + Send>,
    ) -> Result<StatsSnapshot, PipelineError> {
        DirectoryScanner::check_root(root)?;

        let client = Arc::new(ExiftoolClient::with_binary(&self.config.extract_command));
        if !client.probe() {
            warn!(
                tool = %self.config.extract_command,
                "extraction tool not found; every relevant file will be rejected"
            );
        }

        let stats = Arc::new(RunStatistics::new());
        let (path_tx, path_rx) = mpsc::channel::<PathBuf>(QUEUE_CAPACITY);
        let (row_tx, row_rx) = mpsc::channel::<Vec<String>>(QUEUE_CAPACITY);

        info!(root = %root.display(), workers = self.config.workers, "starting ingest run");

        // Producer: the blocking walk feeds the path queue; dropping the
        // sender closes it.
        let scanner = DirectoryScanner::new(self.accepted.clone(), stats.clone());
        let scan_root = root.to_path_buf();
        let producer =
            tokio::task::spawn_blocking(move || scanner.scan(&scan_root, path_tx));

        // Worker pool over the path queue. buffer_unordered caps the
        // number of in-flight files at the configured worker count, and
        // awaiting the result send while the queue is full is what stalls
        // the pool.
        let workers = tokio::spawn({
            let client = client.clone();
            let accepted = self.accepted.clone();
            let stats = stats.clone();
            let worker_count = self.config.workers.max(1);
            let verbose = self.config.verbose;

            async move {
                ReceiverStream::new(path_rx)
                    .map(|path| {
                        let client = client.clone();
                        let accepted = accepted.clone();
                        let stats = stats.clone();
                        async move { process_file(path, &client, &accepted, &stats, verbose).await }
                    })
                    .buffer_unordered(worker_count)
                    .for_each(|row| {
                        let row_tx = row_tx.clone();
                        async move {
                            // Receiver only disappears when the writer is
                            // already gone; nothing left to report to.
                            let _ = row_tx.send(row).await;
                        }
                    })
                    .await;
                // All in-flight files have completed; dropping the sender
                // closes the result queue behind the completion barrier.
                drop(row_tx);
            }
        });

        // Single consumer owning the report destination.
        let writer = tokio::spawn(report::write_report(row_rx, out));

        producer
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))?;
        workers
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))?;
        writer
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))??;

        let snapshot = stats.snapshot();
        info!(
            total = snapshot.total,
            relevant = snapshot.relevant,
            accepted = snapshot.accept,
            rejected = snapshot.reject,
            "ingest run complete"
        );
        Ok(snapshot)
    }
}

/// Process one path end to end. Failures never escape: extraction errors
/// become the degraded Rejected row and a Reject count.
async fn process_file(
    path: PathBuf,
    client: &ExiftoolClient,
    accepted: &MimeTypeSet,
    stats: &RunStatistics,
    verbose: bool,
) -> Vec<String> {
    match client.extract(&path).await {
        Ok(record) => {
            let fields = ResolvedFields::resolve(&record, accepted);
            let classification = classify(&fields);
            match classification.status {
                IngestStatus::Accepted => stats.record_accept(),
                _ => stats.record_reject(),
            }
            report::build_row(&path, &fields, &classification)
        }
        Err(e) => {
            stats.record_reject();
            if verbose {
                warn!(file = %path.display(), error = %e, "error processing file");
            }
            let classification = Classification::rejected(e.to_string());
            report::error_row(&path, &classification.reason)
        }
    }
}
