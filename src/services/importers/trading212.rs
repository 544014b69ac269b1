use csv::ReaderBuilder;
use rust_decimal::Decimal;

use super::{column_index, field};
use crate::services::{
    diagnostics::{DiagnosticLog, SkipReason},
    events::{EventKind, RawEvent, Source, CASH_TICKER},
    parsers::{parse_amount, parse_event_date},
};

const ACTION: &[&str] = &["Action"];
const TIME: &[&str] = &["Time"];
const TICKER: &[&str] = &["Ticker"];
const ISIN: &[&str] = &["ISIN"];
const NAME: &[&str] = &["Name"];
const SHARE_COUNT: &[&str] = &["No. of shares"];
const TOTAL_EUR: &[&str] = &["Total (EUR)"];
const TOTAL: &[&str] = &["Total"];
const TOTAL_CURRENCY: &[&str] = &["Currency (Total)"];
const EXCHANGE_RATE: &[&str] = &["Exchange rate"];
const WITHHOLDING_TAX_EUR: &[&str] = &["Withholding tax (EUR)"];
const WITHHOLDING_TAX: &[&str] = &["Withholding tax"];

fn detect_kind(action: &str) -> Option<EventKind> {
    let action = action.to_lowercase();
    if action.contains("buy") {
        Some(EventKind::Buy)
    } else if action.contains("sell") {
        Some(EventKind::Sell)
    } else if action.contains("dividend") {
        Some(EventKind::Dividend)
    } else if action.contains("interest") || action.contains("lending") {
        Some(EventKind::Interest)
    } else {
        None
    }
}

pub fn extract_trading212_events(
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

        let action = field(&record, &index, ACTION);
        let Some(kind) = detect_kind(action) else {
            diag.skip(
                Source::Trading212.label(),
                row_reference,
                SkipReason::UnrecognizedAction,
                format!("Action: {}", action),
            );
            continue;
        };

        let date = match parse_event_date(field(&record, &index, TIME)) {
            Ok(date) => date,
            Err(_) => {
                diag.skip(
                    Source::Trading212.label(),
                    row_reference,
                    SkipReason::InvalidDate,
                    format!("Time: {}", field(&record, &index, TIME)),
                );
                continue;
            }
        };

        // older exports carry an already converted EUR total, newer ones a
        // native total plus its currency and a conversion rate
        let total_eur = parse_amount(field(&record, &index, TOTAL_EUR));
        let total_native = parse_amount(field(&record, &index, TOTAL));
        let exchange_rate = parse_amount(field(&record, &index, EXCHANGE_RATE));

        let (gross_amount, native_currency, tax_withheld) = if total_eur != Decimal::ZERO {
            (
                total_eur.abs(),
                "EUR".to_string(),
                parse_amount(field(&record, &index, WITHHOLDING_TAX_EUR)).abs(),
            )
        } else if total_native != Decimal::ZERO && exchange_rate != Decimal::ZERO {
            (
                (total_native * exchange_rate).abs(),
                "EUR".to_string(),
                (parse_amount(field(&record, &index, WITHHOLDING_TAX)) * exchange_rate).abs(),
            )
        } else {
            let currency = field(&record, &index, TOTAL_CURRENCY);
            (
                total_native.abs(),
                if currency.is_empty() {
                    "EUR".to_string()
                } else {
                    currency.to_string()
                },
                parse_amount(field(&record, &index, WITHHOLDING_TAX)).abs(),
            )
        };

        let (ticker, display_name) = if kind == EventKind::Interest {
            (CASH_TICKER.to_string(), "Trading 212 Interest".to_string())
        } else {
            let ticker = field(&record, &index, TICKER);
            if ticker.is_empty() {
                diag.skip(
                    Source::Trading212.label(),
                    row_reference,
                    SkipReason::MissingTicker,
                    format!("Action: {}", action),
                );
                continue;
            }
            (
                ticker.to_string(),
                field(&record, &index, NAME).to_string(),
            )
        };

        events.push(RawEvent {
            source: Source::Trading212,
            date,
            kind,
            ticker,
            quantity: parse_amount(field(&record, &index, SHARE_COUNT)).abs(),
            gross_amount,
            native_currency,
            identifier: field(&record, &index, ISIN).to_string(),
            display_name,
            tax_withheld,
        });
    }

    Ok(events)
}
