pub mod revolut;
pub mod trading212;

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use super::{
    diagnostics::DiagnosticLog,
    events::{RawEvent, Source},
    parsers::detect_source_from_csv_header,
};

/// Maps header names to their position so row access survives the column
/// reshuffles both brokers ship between export versions.
pub fn column_index(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(position, name)| (name.trim().to_string(), position))
        .collect()
}

/// Returns the first non-empty cell among the given header candidates, or ""
/// when none of the columns exist in this export version.
pub fn field<'a>(
    record: &'a StringRecord,
    index: &HashMap<String, usize>,
    candidates: &[&str],
) -> &'a str {
    for name in candidates {
        if let Some(&position) = index.get(*name) {
            let value = record.get(position).unwrap_or_default().trim();
            if !value.is_empty() {
                return value;
            }
        }
    }
    ""
}

/// Sniffs the broker from the header row and runs the matching extractor.
/// Unrecognized files produce no events and no skips, they are simply not
/// broker exports.
pub fn extract_events(file_content: &str, diag: &mut DiagnosticLog) -> anyhow::Result<Vec<RawEvent>> {
    let mut header_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file_content.as_bytes());

    let mut first_record = StringRecord::new();
    if !header_reader.read_record(&mut first_record)? {
        return Ok(Vec::new());
    }

    match detect_source_from_csv_header(&first_record) {
        Some(Source::Trading212) => trading212::extract_trading212_events(file_content, diag),
        Some(Source::Revolut) => revolut::extract_revolut_events(file_content, diag),
        None => {
            debug!("Skipping file with unrecognized header row");
            Ok(Vec::new())
        }
    }
}
