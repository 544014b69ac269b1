use csv::ReaderBuilder;

use super::{column_index, field};
use crate::services::{
    diagnostics::{DiagnosticLog, SkipReason},
    events::{EventKind, RawEvent, Source, CASH_TICKER},
    parsers::{parse_amount, parse_event_date},
};

const TYPE: &[&str] = &["Type"];
const DATE: &[&str] = &["Date", "Completed Date"];
const TICKER: &[&str] = &["Ticker", "Symbol"];
const DESCRIPTION: &[&str] = &["Description"];
const AMOUNT: &[&str] = &["Total Amount", "Amount"];
const QUANTITY: &[&str] = &["Quantity"];
const CURRENCY: &[&str] = &["Currency"];

fn detect_kind(row_type: &str, description: &str) -> Option<EventKind> {
    let row_type = row_type.to_uppercase();
    match row_type.as_str() {
        "BUY" | "MARKET BUY" => Some(EventKind::Buy),
        "SELL" | "MARKET SELL" => Some(EventKind::Sell),
        "DIVIDEND" | "DIV" => Some(EventKind::Dividend),
        "INTEREST" => Some(EventKind::Interest),
        _ if description.to_uppercase().contains("SAVINGS") => Some(EventKind::Interest),
        _ => None,
    }
}

pub fn extract_revolut_events(
    file_content: &str,
    diag: &mut DiagnosticLog,
) -> anyhow::Result<Vec<RawEvent>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(file_content.as_bytes());

    let index = column_index(rdr.headers()?);
    let mut events = Vec::new();

    for (row_number, result) in rdr.records().enumerate() {
        let record = result?;
        let row_reference = row_number + 2;

        let row_type = field(&record, &index, TYPE);
        let description = field(&record, &index, DESCRIPTION);
        let Some(kind) = detect_kind(row_type, description) else {
            diag.skip(
                Source::Revolut.label(),
                row_reference,
                SkipReason::UnrecognizedAction,
                format!("Type: {}", row_type),
            );
            continue;
        };

        let date = match parse_event_date(field(&record, &index, DATE)) {
            Ok(date) => date,
            Err(_) => {
                diag.skip(
                    Source::Revolut.label(),
                    row_reference,
                    SkipReason::InvalidDate,
                    format!("Date: {}", field(&record, &index, DATE)),
                );
                continue;
            }
        };

        let (ticker, display_name) = if kind == EventKind::Interest {
            (CASH_TICKER.to_string(), "Revolut Interest".to_string())
        } else {
            let ticker = field(&record, &index, TICKER);
            if ticker.is_empty() {
                diag.skip(
                    Source::Revolut.label(),
                    row_reference,
                    SkipReason::MissingTicker,
                    format!("Type: {}", row_type),
                );
                continue;
            }
            (ticker.to_string(), ticker.to_string())
        };

        let currency = field(&record, &index, CURRENCY);

        // Revolut never ships a security identifier, resolution happens later
        events.push(RawEvent {
            source: Source::Revolut,
            date,
            kind,
            ticker,
            quantity: parse_amount(field(&record, &index, QUANTITY)).abs(),
            gross_amount: parse_amount(field(&record, &index, AMOUNT)).abs(),
            native_currency: if currency.is_empty() {
                "USD".to_string()
            } else {
                currency.to_string()
            },
            identifier: String::new(),
            display_name,
            tax_withheld: rust_decimal::Decimal::ZERO,
        });
    }

    Ok(events)
}
