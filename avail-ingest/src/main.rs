//! avail-ingest - AVAIL ingest readiness checker
//!
//! Walks a directory of media assets, extracts embedded metadata with
//! exiftool, resolves the import-template fields across the IPTC, EXIF and
//! XMP namespaces, and reports which assets are ready for ingest as CSV.

use anyhow::{Context, Result};
use avail_common::MimeTypeSet;
use avail_ingest::pipeline::{IngestPipeline, PipelineConfig};
use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for avail-ingest
#[derive(Parser, Debug)]
#[command(name = "avail-ingest")]
#[command(about = "Ingest readiness report for a directory of media assets")]
#[command(version)]
struct Args {
    /// Directory to process, recursively
    #[arg(short, long, env = "AVAIL_INGEST_DIR")]
    dir: PathBuf,

    /// YAML config file listing accepted MIME types
    #[arg(short, long, env = "AVAIL_INGEST_CONFIG")]
    config: Option<PathBuf>,

    /// Report destination; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of extraction workers
    #[arg(short = 'p', long, default_value_t = num_cpus::get())]
    workers: usize,

    /// Log every per-file error while processing
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The report may own stdout, so diagnostics go to stderr
    let default_filter = if args.verbose {
        "avail_ingest=debug,avail_common=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting avail-ingest v{}", env!("CARGO_PKG_VERSION"));

    let accepted = MimeTypeSet::load(args.config.as_deref())
        .context("failed to load MIME type configuration")?;

    let out: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("error opening output file {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let pipeline = IngestPipeline::new(
        PipelineConfig {
            workers: args.workers,
            verbose: args.verbose,
            ..PipelineConfig::default()
        },
        accepted,
    );

    let stats = pipeline
        .run(&args.dir, out)
        .await
        .with_context(|| format!("error processing {}", args.dir.display()))?;

    info!("Total Found: {}", stats.total);
    info!("Relevant Files: {}", stats.relevant);
    info!("Rejected Files: {}", stats.reject);
    info!("Accepted Files: {}", stats.accept);

    Ok(())
}
