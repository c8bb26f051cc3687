//! Canonical field resolution across metadata namespaces
//!
//! The import template wants one value per semantic field, but three
//! generations of embedding standards define overlapping tags for the same
//! concepts, and real archives populate them inconsistently (XMP Title used
//! as a headline, identifiers scattered across transmission-reference
//! fields, and so on). Each canonical field therefore resolves through a
//! fixed fallback chain, highest precedence first, short-circuiting at the
//! first non-empty value. The chains are domain knowledge, not
//! configuration.
//!
//! Resolution is eager: a [`ResolvedFields`] is computed once per record
//! and never mutated, and `date_created` is present only when a source
//! string existed *and* parsed, so the `has_*` predicates and the report
//! row builder always agree.

use crate::types::MetadataRecord;
use avail_common::MimeTypeSet;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::debug;

/// Timestamp text matched none of the known layouts.
#[derive(Debug, Error)]
#[error("unrecognized timestamp layout: {0:?}")]
pub struct DateParseError(pub String);

/// Canonical import fields for one asset.
#[derive(Debug, Clone)]
pub struct ResolvedFields {
    date_created: Option<DateTime<FixedOffset>>,
    title: Option<String>,
    description: Option<String>,
    keywords: Option<String>,
    asset_id: String,
    location: Option<String>,
    media_type: Option<String>,
    file_format: Option<String>,
    photographer: Option<String>,
}

impl ResolvedFields {
    /// Resolve every canonical field for one record. `accepted` scopes the
    /// media-type and file-format fields to the MIME types this run cares
    /// about.
    pub fn resolve(record: &MetadataRecord, accepted: &MimeTypeSet) -> Self {
        Self {
            date_created: resolve_date_created(record),
            title: resolve_title(record),
            description: resolve_description(record),
            keywords: resolve_keywords(record),
            asset_id: resolve_asset_id(record),
            location: resolve_location(record),
            media_type: resolve_media_type(record, accepted),
            file_format: resolve_file_format(record, accepted),
            photographer: resolve_photographer(record),
        }
    }

    pub fn date_created(&self) -> Option<DateTime<FixedOffset>> {
        self.date_created
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn keywords(&self) -> Option<&str> {
        self.keywords.as_deref()
    }

    /// Asset identifier; non-empty whenever the record carried a file name,
    /// via the filename-sans-extension fallback.
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn file_format(&self) -> Option<&str> {
        self.file_format.as_deref()
    }

    pub fn photographer(&self) -> Option<&str> {
        self.photographer.as_deref()
    }

    /// True only when a creation date resolved *and* parsed.
    pub fn has_date_created(&self) -> bool {
        self.date_created.is_some()
    }

    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }

    pub fn has_keywords(&self) -> bool {
        self.keywords.is_some()
    }

    pub fn has_asset_id(&self) -> bool {
        !self.asset_id.is_empty()
    }

    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }

    pub fn has_media_type(&self) -> bool {
        self.media_type.is_some()
    }

    pub fn has_file_format(&self) -> bool {
        self.file_format.is_some()
    }

    pub fn has_photographer(&self) -> bool {
        self.photographer.is_some()
    }
}

/// IPTC stores the creation date and time in separate tags; concatenating
/// and trimming lets a date-only pair still parse, while a bare time fails
/// (useless without the day anyway). Falls back to EXIF DateTimeOriginal,
/// then XMP DateCreated (the date the intellectual property was created;
/// CreateDate tracks the digital representation instead).
fn resolve_date_created(record: &MetadataRecord) -> Option<DateTime<FixedOffset>> {
    let iptc_pair = format!(
        "{} {}",
        record.iptc("DateCreated").unwrap_or_default(),
        record.iptc("TimeCreated").unwrap_or_default()
    );
    let iptc_pair = iptc_pair.trim();

    let raw = if !iptc_pair.is_empty() {
        iptc_pair
    } else if let Some(v) = record.exif("DateTimeOriginal") {
        v
    } else if let Some(v) = record.xmp("DateCreated") {
        v
    } else {
        return None;
    };

    match parse_timestamp(raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(error = %e, "creation date did not parse");
            None
        }
    }
}

/// IPTC ObjectName is the standards-blessed short identifier; Headline and
/// the XMP Title are the stand-ins seen in practice. EXIF has no
/// equivalent.
fn resolve_title(record: &MetadataRecord) -> Option<String> {
    record
        .iptc("ObjectName")
        .or_else(|| record.iptc("Headline"))
        .or_else(|| record.xmp("Title"))
        .map(str::to_owned)
}

fn resolve_description(record: &MetadataRecord) -> Option<String> {
    record
        .iptc("Caption-Abstract")
        .or_else(|| record.exif("ImageDescription"))
        .or_else(|| record.xmp("Description"))
        .map(str::to_owned)
}

/// IPTC Keywords, else the XMP Subject bag. EXIF has no keyword tag.
fn resolve_keywords(record: &MetadataRecord) -> Option<String> {
    record
        .iptc("Keywords")
        .or_else(|| record.xmp("Subject"))
        .map(str::to_owned)
}

/// The asset identifier hides in several transmission-reference and
/// identifier tags depending on which tool wrote the file. The filename
/// with its extension stripped is the fallback of last resort, so this
/// resolves non-empty for any record carrying a FileName.
fn resolve_asset_id(record: &MetadataRecord) -> String {
    record
        .iptc("OriginalTransmissionReference")
        .or_else(|| record.iptc("JobID"))
        .or_else(|| record.exif("ImageUniqueID"))
        .or_else(|| record.xmp("Identifier"))
        .or_else(|| record.xmp("TransmissionReference"))
        .map(str::to_owned)
        .unwrap_or_else(|| {
            strip_extension(record.file_info("FileName").unwrap_or_default()).to_owned()
        })
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// City, region and country each resolve IPTC-first with an XMP fallback;
/// whatever parts are present join with ", ". EXIF only carries GPS
/// coordinates, which the import template does not take.
fn resolve_location(record: &MetadataRecord) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    if let Some(city) = record.iptc("City").or_else(|| record.xmp("City")) {
        parts.push(city);
    }
    if let Some(region) = record.iptc("Province-State").or_else(|| record.xmp("State")) {
        parts.push(region);
    }
    if let Some(country) = record
        .iptc("Country-PrimaryLocationName")
        .or_else(|| record.xmp("Country"))
    {
        parts.push(country);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Media type is the primary component of the MIME type (XMP dc:format,
/// else the extraction tool's file probe), reported only when the full
/// MIME type is in the accepted set and the component is audio, image or
/// video.
fn resolve_media_type(record: &MetadataRecord, accepted: &MimeTypeSet) -> Option<String> {
    let mime = record.xmp("Format").or_else(|| record.file_info("MIMEType"))?;
    if !accepted.contains(mime) {
        return None;
    }

    let kind = mime.split('/').next().unwrap_or_default();
    matches!(kind, "audio" | "image" | "video").then(|| kind.to_owned())
}

/// File format is the extraction tool's detected file type; none of the
/// metadata standards carry one. Reported only when the detected MIME type
/// is in the accepted set.
fn resolve_file_format(record: &MetadataRecord, accepted: &MimeTypeSet) -> Option<String> {
    let mime = record.file_info("MIMEType")?;
    if !accepted.contains(mime) {
        return None;
    }
    record.file_info("FileType").map(str::to_owned)
}

fn resolve_photographer(record: &MetadataRecord) -> Option<String> {
    record
        .iptc("By-line")
        .or_else(|| record.exif("Artist"))
        .or_else(|| record.xmp("Artist"))
        .map(str::to_owned)
}

const LAYOUT_DATE_ONLY: &str = "%Y:%m:%d";
const LAYOUT_DATETIME: &str = "%Y:%m:%d %H:%M:%S";
const LAYOUT_DATETIME_FRAC: &str = "%Y:%m:%d %H:%M:%S%.f";
const LAYOUT_DATETIME_ZONE: &str = "%Y:%m:%d %H:%M:%S%:z";
const LAYOUT_DATETIME_FRAC_ZONE: &str = "%Y:%m:%d %H:%M:%S%.f%:z";

/// Parse one of the timestamp layouts the extraction tool emits. It
/// normalizes embedded dates to the exif style `YYYY:MM:DD HH:MM:SS`,
/// optionally with fractional seconds and a UTC-offset suffix, or a bare
/// date. The layout is chosen by inspecting the string (a decimal point
/// means fractional seconds, a trailing `±HH:MM` means an offset), with
/// the date-only layout as the last resort. Naive values are interpreted
/// as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, DateParseError> {
    let trimmed = raw.trim();
    let timed = match (trimmed.contains('.'), has_trailing_offset(trimmed)) {
        (true, true) => DateTime::parse_from_str(trimmed, LAYOUT_DATETIME_FRAC_ZONE),
        (false, true) => DateTime::parse_from_str(trimmed, LAYOUT_DATETIME_ZONE),
        (true, false) => {
            NaiveDateTime::parse_from_str(trimmed, LAYOUT_DATETIME_FRAC).map(naive_as_utc)
        }
        (false, false) => {
            NaiveDateTime::parse_from_str(trimmed, LAYOUT_DATETIME).map(naive_as_utc)
        }
    };

    timed
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, LAYOUT_DATE_ONLY)
                .map(|date| naive_as_utc(date.and_time(NaiveTime::MIN)))
        })
        .map_err(|_| DateParseError(trimmed.to_owned()))
}

fn naive_as_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    naive.and_utc().fixed_offset()
}

/// True for a trailing sign-prefixed `±HH:MM` offset.
fn has_trailing_offset(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 6 {
        return false;
    }
    let tail = &bytes[bytes.len() - 6..];
    (tail[0] == b'+' || tail[0] == b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Namespace;
    use chrono::{SecondsFormat, Timelike};

    fn record(tags: &[(Namespace, &str, &str)]) -> MetadataRecord {
        let mut record = MetadataRecord::new();
        for (namespace, key, value) in tags {
            record.insert(*namespace, key.to_string(), value.to_string());
        }
        record
    }

    fn all_media() -> MimeTypeSet {
        MimeTypeSet::from_types(["image/jpeg", "image/tiff", "audio/wav", "video/mp4"])
    }

    #[test]
    fn test_date_created_prefers_iptc_pair() {
        let record = record(&[
            (Namespace::Iptc, "DateCreated", "2011:03:15"),
            (Namespace::Iptc, "TimeCreated", "10:20:30"),
            (Namespace::Exif, "DateTimeOriginal", "1999:01:01 00:00:00"),
            (Namespace::Xmp, "DateCreated", "1988:01:01"),
        ]);

        let fields = ResolvedFields::resolve(&record, &all_media());
        let date = fields.date_created().unwrap();
        assert_eq!(
            date.to_rfc3339_opts(SecondsFormat::Secs, true),
            "2011-03-15T10:20:30Z"
        );
    }

    #[test]
    fn test_date_created_falls_back_to_exif_then_xmp() {
        let exif_only = record(&[(Namespace::Exif, "DateTimeOriginal", "1999:01:02 03:04:05")]);
        let fields = ResolvedFields::resolve(&exif_only, &all_media());
        assert_eq!(
            fields.date_created().unwrap().to_rfc3339_opts(SecondsFormat::Secs, true),
            "1999-01-02T03:04:05Z"
        );

        let xmp_only = record(&[(Namespace::Xmp, "DateCreated", "1988:06:07")]);
        let fields = ResolvedFields::resolve(&xmp_only, &all_media());
        assert_eq!(
            fields.date_created().unwrap().to_rfc3339_opts(SecondsFormat::Secs, true),
            "1988-06-07T00:00:00Z"
        );
    }

    #[test]
    fn test_iptc_date_without_time_parses_date_only() {
        let record = record(&[(Namespace::Iptc, "DateCreated", "2011:03:15")]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert!(fields.has_date_created());
    }

    #[test]
    fn test_unparseable_date_degrades_has_predicate() {
        let record = record(&[(Namespace::Iptc, "TimeCreated", "10:20:30")]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        // A bare time is useless without the day; it must not classify as dated
        assert!(!fields.has_date_created());
    }

    #[test]
    fn test_keywords_fall_back_to_xmp_subject() {
        let record = record(&[(Namespace::Xmp, "Subject", "lunar, regolith")]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.keywords(), Some("lunar, regolith"));
    }

    #[test]
    fn test_keywords_prefer_iptc() {
        let record = record(&[
            (Namespace::Iptc, "Keywords", "iptc words"),
            (Namespace::Xmp, "Subject", "xmp words"),
        ]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.keywords(), Some("iptc words"));
    }

    #[test]
    fn test_title_chain() {
        let record = record(&[
            (Namespace::Iptc, "Headline", "headline"),
            (Namespace::Xmp, "Title", "xmp title"),
        ]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.title(), Some("headline"));
    }

    #[test]
    fn test_asset_id_filename_fallback() {
        let record = record(&[(Namespace::FileInfo, "FileName", "sts-135_launch.tiff")]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.asset_id(), "sts-135_launch");
        assert!(fields.has_asset_id());
    }

    #[test]
    fn test_asset_id_prefers_transmission_reference() {
        let record = record(&[
            (Namespace::Iptc, "OriginalTransmissionReference", "NHQ201501090001"),
            (Namespace::FileInfo, "FileName", "whatever.jpg"),
        ]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.asset_id(), "NHQ201501090001");
    }

    #[test]
    fn test_asset_id_empty_without_filename() {
        let fields = ResolvedFields::resolve(&MetadataRecord::new(), &all_media());
        assert!(!fields.has_asset_id());
    }

    #[test]
    fn test_location_joins_present_parts() {
        let record = record(&[
            (Namespace::Iptc, "City", "Cape Canaveral"),
            (Namespace::Iptc, "Country-PrimaryLocationName", "USA"),
        ]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.location(), Some("Cape Canaveral, USA"));
    }

    #[test]
    fn test_location_region_falls_back_to_xmp() {
        let record = record(&[(Namespace::Xmp, "State", "Florida")]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.location(), Some("Florida"));
    }

    #[test]
    fn test_location_empty_when_all_parts_empty() {
        let fields = ResolvedFields::resolve(&MetadataRecord::new(), &all_media());
        assert!(!fields.has_location());
    }

    #[test]
    fn test_media_type_requires_accepted_mime() {
        let record = record(&[
            (Namespace::FileInfo, "MIMEType", "application/pdf"),
            (Namespace::FileInfo, "FileType", "PDF"),
        ]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert!(!fields.has_media_type());
        assert!(!fields.has_file_format());
    }

    #[test]
    fn test_media_type_is_primary_component() {
        let record = record(&[
            (Namespace::FileInfo, "MIMEType", "image/jpeg"),
            (Namespace::FileInfo, "FileType", "JPEG"),
        ]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.media_type(), Some("image"));
        assert_eq!(fields.file_format(), Some("JPEG"));
    }

    #[test]
    fn test_media_type_prefers_xmp_format() {
        let record = record(&[
            (Namespace::Xmp, "Format", "video/mp4"),
            (Namespace::FileInfo, "MIMEType", "image/jpeg"),
        ]);
        let fields = ResolvedFields::resolve(&record, &all_media());
        assert_eq!(fields.media_type(), Some("video"));
    }

    #[test]
    fn test_photographer_chain() {
        let artists = record(&[
            (Namespace::Exif, "Artist", "exif artist"),
            (Namespace::Xmp, "Artist", "xmp artist"),
        ]);
        let fields = ResolvedFields::resolve(&artists, &all_media());
        assert_eq!(fields.photographer(), Some("exif artist"));

        let byline = record(&[(Namespace::Iptc, "By-line", "A. Photographer")]);
        let fields = ResolvedFields::resolve(&byline, &all_media());
        assert_eq!(fields.photographer(), Some("A. Photographer"));
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let plain = parse_timestamp("2015:01:09 01:32:16").unwrap();
        assert_eq!(plain.to_rfc3339_opts(SecondsFormat::Secs, true), "2015-01-09T01:32:16Z");

        let frac = parse_timestamp("2015:01:09 01:32:16.90").unwrap();
        assert_eq!(frac.nanosecond(), 900_000_000);

        let zoned = parse_timestamp("2015:01:09 01:32:16-05:00").unwrap();
        assert_eq!(zoned.offset().local_minus_utc(), -5 * 3600);

        let positive = parse_timestamp("2015:01:09 01:32:16+05:30").unwrap();
        assert_eq!(positive.offset().local_minus_utc(), 5 * 3600 + 1800);

        let frac_zoned = parse_timestamp("2015:01:09 01:32:16.25-05:00").unwrap();
        assert_eq!(frac_zoned.nanosecond(), 250_000_000);

        let date_only = parse_timestamp("2015:01:09").unwrap();
        assert_eq!(date_only.to_rfc3339_opts(SecondsFormat::Secs, true), "2015-01-09T00:00:00Z");
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("01:32:16").is_err());
        assert!(parse_timestamp("2015-01-09T01:32:16Z").is_err());
        assert!(parse_timestamp("not a date").is_err());
    }
}
