use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::Decimal;

use super::events::Source;

/// Parses a locale-variant monetary or quantity cell. Currency symbols,
/// thousands separators and non-breaking spaces are stripped. Empty or
/// malformed cells yield zero on purpose: a broken numeric cell must never
/// abort a run, the zero-value filter downstream catches the fallout.
pub fn parse_amount(text: &str) -> Decimal {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | '\u{a0}' | ' '))
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Parses an event date, trying the known broker layouts in order. Unlike
/// `parse_amount` this is a hard error: a defaulted date would corrupt
/// ordering and year filtering, so the caller must record a skip instead.
pub fn parse_event_date(text: &str) -> anyhow::Result<NaiveDate> {
    let text = text.trim();

    for format in DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(timestamp.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }

    Err(anyhow!("Unable to parse event date '{}'", text))
}

pub fn detect_source_from_csv_header(record: &StringRecord) -> Option<Source> {
    let first = record.get(0).unwrap_or_default();

    if first.contains("Action") {
        return Some(Source::Trading212);
    }
    if first == "Type" || (first == "Date" && record.get(1) == Some("Ticker")) {
        return Some(Source::Revolut);
    }
    None
}
