//! CSV reading: raw upload text to field-keyed records.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

/// A data row the pipeline dropped, with the 1-based line number it came
/// from and why. Surfaced to the caller even on a successful upload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedRow {
    pub row: u64,
    pub reason: String,
}

/// One parsed CSV record: header name (lowercased) to trimmed value.
/// Empty values are absent rather than empty strings.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// 1-based line number in the uploaded file, for diagnostics.
    pub line: u64,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub records: Vec<RawRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Parse the raw upload into a materialized record sequence.
///
/// The first non-blank line is the header; subsequent lines are zipped
/// against it by position. Records with fewer fields than the header simply
/// lack those fields; extra fields are ignored. Unreadable records are
/// skipped with a diagnostic instead of failing the upload.
pub fn parse(raw: &str) -> ParsedCsv {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            return ParsedCsv {
                records: Vec::new(),
                skipped: vec![SkippedRow {
                    row: 1,
                    reason: format!("unreadable header: {e}"),
                }],
            }
        }
    };

    let mut parsed = ParsedCsv::default();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(0);
                parsed.skipped.push(SkippedRow {
                    row: line,
                    reason: format!("unreadable record: {e}"),
                });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let mut fields = HashMap::new();
        for (name, value) in headers.iter().zip(record.iter()) {
            if !value.is_empty() {
                fields.insert(name.to_ascii_lowercase(), value.to_string());
            }
        }

        parsed.records.push(RawRecord { line, fields });
    }

    parsed
}
