use chrono::Datelike;
use rust_decimal::Decimal;

use super::{envelope, format_decimal, Filing, NS_DIV};
use crate::services::{
    diagnostics::{DiagnosticLog, SkipReason},
    events::EventKind,
    ledger::LedgerEntry,
    shared::env::PipelineConfig,
};

/// Payer country from the identifier prefix. ISINs start with the issuing
/// country; anything that does not look like one defaults to US, by far the
/// most common payer for these brokers.
fn payer_country(identifier: &str) -> String {
    let prefix: String = identifier.chars().take(2).collect();
    if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        prefix.to_uppercase()
    } else {
        "US".to_string()
    }
}

pub fn build_dividend_filing(
    ledger: &[LedgerEntry],
    config: &PipelineConfig,
    diag: &mut DiagnosticLog,
) -> Filing {
    let mut root = envelope(NS_DIV, &config.filer);
    let body = root.push("body");
    let document = body.push("Doh_Div");
    document.push_text("Period", config.tax_year.to_string());
    if !config.filer.email.is_empty() {
        document.push_text("EmailAddress", &config.filer.email);
    }
    if !config.filer.phone.is_empty() {
        document.push_text("PhoneNumber", &config.filer.phone);
    }
    document.push_text("ResidentCountry", &config.filer.resident_country);
    document.push_text("IsResident", config.filer.is_resident.to_string());

    let mut record_count = 0;
    let mut total = Decimal::ZERO;

    for entry in ledger {
        if entry.kind != EventKind::Dividend || entry.date.year() != config.tax_year {
            continue;
        }

        let value = entry.value_eur.round_dp(2);
        if value <= Decimal::ZERO {
            diag.skip(
                entry.source.label(),
                entry.date,
                SkipReason::ZeroValue,
                format!("DIVIDEND {} (filing record)", entry.ticker),
            );
            continue;
        }

        let record = document.push("Dividend");
        record.push_text("Date", entry.date.to_string());
        record.push_text(
            "PayerName",
            if entry.display_name.is_empty() {
                "Unknown"
            } else {
                &entry.display_name
            },
        );
        let country = payer_country(&entry.identifier);
        record.push_text("PayerCountry", &country);
        record.push_text("Type", "1");
        record.push_text("Value", format_decimal(value, 2));

        if country != config.filer.resident_country {
            record.push_text(
                "ForeignTax",
                format_decimal(entry.tax_withheld_eur.round_dp(2), 2),
            );
            record.push_text("SourceCountry", &country);
        }

        record_count += 1;
        total += value;
    }

    Filing {
        name: "Doh-Div (dividends)",
        file_name: "Doh-Div.xml",
        envelope: root,
        record_count,
        total_eur: total,
    }
}
