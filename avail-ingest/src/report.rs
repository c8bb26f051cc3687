//! Report rows for the ingest CSV
//!
//! The report is a fixed 16-column contract matching the import template.
//! Four columns are placeholders the template requires but this tool cannot
//! populate; they carry the literal `N/A`. Files whose extraction failed
//! get the degraded row shape: path, Rejected, the error text, and empty
//! metadata cells.

use crate::classify::{Classification, IngestStatus};
use crate::resolve::ResolvedFields;
use chrono::SecondsFormat;
use csv::Writer;
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::warn;

/// Report column order. Row builders must match this exactly.
pub const REPORT_HEADER: [&str; 16] = [
    "Path",
    "Status",
    "Reason",
    "NASA ID",
    "Title",
    "508 Description",
    "Description",
    "Date Created",
    "Location",
    "Keywords",
    "Media Type",
    "File Format",
    "Center",
    "Secondary Creator Credit",
    "Photographer",
    "Album",
];

/// Placeholder for template columns this tool does not populate.
const NOT_AVAILABLE: &str = "N/A";

/// Build the row for a file whose metadata was extracted, whatever its
/// classification. Date Created is RFC 3339, empty when absent.
pub fn build_row(
    path: &Path,
    fields: &ResolvedFields,
    classification: &Classification,
) -> Vec<String> {
    let date_created = fields
        .date_created()
        .map(|date| date.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default();

    vec![
        path.display().to_string(),
        classification.status.to_string(),
        classification.reason.clone(),
        fields.asset_id().to_string(),
        fields.title().unwrap_or_default().to_string(),
        NOT_AVAILABLE.to_string(),
        fields.description().unwrap_or_default().to_string(),
        date_created,
        fields.location().unwrap_or_default().to_string(),
        fields.keywords().unwrap_or_default().to_string(),
        fields.media_type().unwrap_or_default().to_string(),
        fields.file_format().unwrap_or_default().to_string(),
        NOT_AVAILABLE.to_string(),
        NOT_AVAILABLE.to_string(),
        fields.photographer().unwrap_or_default().to_string(),
        NOT_AVAILABLE.to_string(),
    ]
}

/// Degraded row shape for extraction failures.
pub fn error_row(path: &Path, reason: &str) -> Vec<String> {
    let mut row = vec![
        path.display().to_string(),
        IngestStatus::Rejected.to_string(),
        reason.to_string(),
    ];
    row.resize(REPORT_HEADER.len(), String::new());
    row
}

/// Drain rows from the result queue into the CSV destination.
///
/// The writer exclusively owns the output; workers never touch it. A row
/// that fails to write is logged and skipped; the writer keeps draining
/// until the queue closes, then flushes. Header and final-flush failures
/// are the only errors worth surfacing.
pub async fn write_report(
    mut rows: mpsc::Receiver<Vec<String>>,
    out: Box<dyn Write + Send>,
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(REPORT_HEADER)?;
    writer.flush()?;

    while let Some(row) = rows.recv().await {
        if let Err(e) = writer.write_record(&row) {
            warn!(
                path = row.first().map(String::as_str).unwrap_or_default(),
                error = %e,
                "error writing report row"
            );
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::types::{MetadataRecord, Namespace};
    use avail_common::MimeTypeSet;

    fn resolve(tags: &[(Namespace, &str, &str)]) -> ResolvedFields {
        let mut record = MetadataRecord::new();
        for (namespace, key, value) in tags {
            record.insert(*namespace, key.to_string(), value.to_string());
        }
        ResolvedFields::resolve(&record, &MimeTypeSet::from_types(["image/jpeg"]))
    }

    #[test]
    fn test_row_matches_header_width() {
        let fields = resolve(&[]);
        let row = build_row(Path::new("a.jpg"), &fields, &classify(&fields));
        assert_eq!(row.len(), REPORT_HEADER.len());
    }

    #[test]
    fn test_accepted_row_cells() {
        let fields = resolve(&[
            (Namespace::Exif, "DateTimeOriginal", "2015:01:09 01:32:16.90"),
            (Namespace::Iptc, "Caption-Abstract", "desc"),
            (Namespace::FileInfo, "FileName", "img.jpg"),
            (Namespace::FileInfo, "MIMEType", "image/jpeg"),
            (Namespace::FileInfo, "FileType", "JPEG"),
        ]);
        let classification = classify(&fields);
        let row = build_row(Path::new("dir/img.jpg"), &fields, &classification);

        assert_eq!(row[0], "dir/img.jpg");
        assert_eq!(row[1], "Accepted");
        assert_eq!(row[2], "");
        assert_eq!(row[3], "img");
        assert_eq!(row[5], "N/A");
        assert_eq!(row[6], "desc");
        assert_eq!(row[7], "2015-01-09T01:32:16.900Z");
        assert_eq!(row[10], "image");
        assert_eq!(row[11], "JPEG");
        assert_eq!(row[12], "N/A");
        assert_eq!(row[13], "N/A");
        assert_eq!(row[15], "N/A");
    }

    #[test]
    fn test_incomplete_row_with_file_info_only() {
        let fields = resolve(&[
            (Namespace::FileInfo, "FileName", "bare.jpg"),
            (Namespace::FileInfo, "MIMEType", "image/jpeg"),
            (Namespace::FileInfo, "FileType", "JPEG"),
        ]);
        let classification = classify(&fields);
        let row = build_row(Path::new("bare.jpg"), &fields, &classification);

        assert_eq!(row[1], "Incomplete");
        assert_eq!(row[2], "Minimum metadata not provided");
        // Metadata cells empty, derived cells populated
        assert_eq!(row[3], "bare");
        assert_eq!(row[4], "");
        assert_eq!(row[6], "");
        assert_eq!(row[7], "");
        assert_eq!(row[9], "");
        assert_eq!(row[10], "image");
        assert_eq!(row[11], "JPEG");
    }

    #[test]
    fn test_error_row_shape() {
        let row = error_row(Path::new("gone.jpg"), "exit code: Some(1), stderr: no such file");
        assert_eq!(row.len(), REPORT_HEADER.len());
        assert_eq!(row[0], "gone.jpg");
        assert_eq!(row[1], "Rejected");
        assert_eq!(row[2], "exit code: Some(1), stderr: no such file");
        assert!(row[3..].iter().all(String::is_empty));
    }

    #[tokio::test]
    async fn test_write_report_emits_header_and_rows() {
        let (tx, rx) = mpsc::channel(4);
        let file = tempfile::NamedTempFile::new().unwrap();
        let out = Box::new(file.reopen().unwrap());

        tx.send(error_row(Path::new("x.jpg"), "boom")).await.unwrap();
        drop(tx);
        write_report(rx, out).await.unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = written.lines();
        assert!(lines.next().unwrap().starts_with("Path,Status,Reason,NASA ID"));
        assert!(lines.next().unwrap().starts_with("x.jpg,Rejected,boom,"));
        assert_eq!(lines.next(), None);
    }
}
