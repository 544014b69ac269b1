use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;

use super::{envelope, push_decimal, xml::Element, Filing, ZeroPolicy, NS_KDVP};
use crate::services::{
    diagnostics::{DiagnosticLog, SkipReason},
    events::EventKind,
    ledger::LedgerEntry,
    shared::env::PipelineConfig,
};

/// Builds the capital gains inventory. A security enters the document only
/// when at least one of its disposals falls into the reporting year; the
/// inventory then lists every trade of that security, since the acquisition
/// history is what prices the disposal.
pub fn build_capital_gains_filing(
    ledger: &[LedgerEntry],
    config: &PipelineConfig,
    diag: &mut DiagnosticLog,
) -> Filing {
    let mut groups: BTreeMap<&str, Vec<&LedgerEntry>> = BTreeMap::new();
    for entry in ledger {
        if matches!(entry.kind, EventKind::Buy | EventKind::Sell) {
            groups.entry(&entry.ticker).or_default().push(entry);
        }
    }

    groups.retain(|_, trades| {
        trades.iter().any(|trade| {
            trade.kind == EventKind::Sell && trade.date.year() == config.tax_year
        })
    });

    let mut root = envelope(NS_KDVP, &config.filer);
    let body = root.push("body");
    let document = body.push("Doh_KDVP");

    let head = document.push("KDVP");
    head.push_text("DocumentWorkflowID", "O");
    head.push_text("Year", config.tax_year.to_string());
    head.push_text("IsResident", config.filer.is_resident.to_string());
    head.push_text("SecurityCount", groups.len().to_string());

    let mut record_count = 0;
    let mut total_disposals = Decimal::ZERO;

    for (ticker, trades) in &groups {
        let mut item = Element::new("KDVPItem");
        item.push_text(
            "Naziv",
            trades
                .iter()
                .map(|trade| trade.display_name.as_str())
                .find(|name| !name.is_empty())
                .unwrap_or(ticker),
        );
        item.push_text(
            "Isin",
            trades
                .iter()
                .map(|trade| trade.identifier.as_str())
                .find(|identifier| !identifier.is_empty())
                .unwrap_or(ticker),
        );

        let mut acquisitions = Element::new("Pridobitve");
        let mut disposals = Element::new("Odsvojitve");

        for trade in trades {
            let mut row = Element::new("Vrstica");
            let complete = match trade.kind {
                EventKind::Buy => {
                    row.push_text("DatumPridobitve", trade.date.to_string());
                    row.push_text("NacinPridobitve", "A");
                    push_decimal(&mut row, "Kolicina", trade.quantity, 4, ZeroPolicy::SkipRecord)
                        && push_decimal(
                            &mut row,
                            "NabavnaVrednost",
                            trade.value_eur,
                            4,
                            ZeroPolicy::SkipRecord,
                        )
                }
                EventKind::Sell => {
                    row.push_text("DatumOdsvojitve", trade.date.to_string());
                    row.push_text("NacinOdsvojitve", "A");
                    push_decimal(&mut row, "Kolicina", trade.quantity, 4, ZeroPolicy::SkipRecord)
                        && push_decimal(
                            &mut row,
                            "VrednostObOdsvojitvi",
                            trade.value_eur,
                            4,
                            ZeroPolicy::SkipRecord,
                        )
                }
                _ => unreachable!(),
            };

            if !complete {
                diag.skip(
                    trade.source.label(),
                    trade.date,
                    SkipReason::ZeroValue,
                    format!("{} {} (inventory row)", trade.kind.label(), trade.ticker),
                );
                continue;
            }

            match trade.kind {
                EventKind::Buy => acquisitions.push_child(row),
                EventKind::Sell => {
                    if trade.date.year() == config.tax_year {
                        total_disposals += trade.value_eur;
                    }
                    disposals.push_child(row);
                }
                _ => unreachable!(),
            }
        }

        if acquisitions.has_children() {
            item.push_child(acquisitions);
        }
        if disposals.has_children() {
            item.push_child(disposals);
        }

        record_count += 1;
        document.push_child(item);
    }

    Filing {
        name: "Doh-KDVP (capital gains)",
        file_name: "Doh-KDVP.xml",
        envelope: root,
        record_count,
        total_eur: total_disposals,
    }
}
