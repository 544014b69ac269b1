use chrono::Datelike;
use rust_decimal::Decimal;

use super::{envelope, format_decimal, Filing, NS_OBR};
use crate::services::{
    diagnostics::{DiagnosticLog, SkipReason},
    events::{EventKind, Source},
    ledger::LedgerEntry,
    shared::env::PipelineConfig,
};

/// Interest classification is fixed per broker: Revolut pays through a
/// Lithuanian bank deposit program, Trading 212 through its UK entity.
fn interest_classification(source: Source) -> (&'static str, &'static str) {
    match source {
        Source::Revolut => ("1", "LT"),
        Source::Trading212 => ("3", "GB"),
    }
}

pub fn build_interest_filing(
    ledger: &[LedgerEntry],
    config: &PipelineConfig,
    diag: &mut DiagnosticLog,
) -> Filing {
    let mut root = envelope(NS_OBR, &config.filer);
    let body = root.push("body");
    let document = body.push("Doh_Obr");
    document.push_text("Period", config.tax_year.to_string());
    document.push_text("DocumentWorkflowID", "O");
    if !config.filer.email.is_empty() {
        document.push_text("Email", &config.filer.email);
    }
    if !config.filer.phone.is_empty() {
        document.push_text("TelephoneNumber", &config.filer.phone);
    }
    document.push_text(
        "ResidentOfRepublicOfSlovenia",
        config.filer.is_resident.to_string(),
    );
    document.push_text("Country", &config.filer.resident_country);

    let mut record_count = 0;
    let mut total = Decimal::ZERO;

    for entry in ledger {
        if entry.kind != EventKind::Interest || entry.date.year() != config.tax_year {
            continue;
        }

        let value = entry.value_eur.round_dp(2);
        if value == Decimal::ZERO {
            diag.skip(
                entry.source.label(),
                entry.date,
                SkipReason::ZeroValue,
                format!("INTEREST {} (filing record)", entry.display_name),
            );
            continue;
        }

        let (kind_code, country) = interest_classification(entry.source);

        let record = document.push("ObrestiItem");
        record.push_text("DatumPrejetja", entry.date.to_string());
        record.push_text("VrstaObresti", kind_code);
        record.push_text("Opis", &entry.display_name);
        record.push_text("Znesek", format_decimal(value, 2));
        record.push_text("Drzava", country);

        let tax = entry.tax_withheld_eur.round_dp(2);
        if tax != Decimal::ZERO {
            record.push_text("TujDavek", format_decimal(tax, 2));
            record.push_text("DrzavaVir", country);
        }

        record_count += 1;
        total += value;
    }

    Filing {
        name: "Doh-Obr (interest)",
        file_name: "Doh-Obr.xml",
        envelope: root,
        record_count,
        total_eur: total,
    }
}
