use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    diagnostics::{ConversionAudit, DiagnosticLog, SkipReason},
    events::{EventKind, RawEvent, Source},
    market_data::fx_rates::{RateLookup, RateTable},
};

/// One row of the canonical ledger. All monetary values are EUR unless the
/// row failed conversion, in which case it keeps its native amount and is
/// flagged in the skip log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub source: Source,
    pub date: NaiveDate,
    pub kind: EventKind,
    pub ticker: String,
    pub identifier: String,
    pub display_name: String,
    pub quantity: Decimal,
    pub value_eur: Decimal,
    pub tax_withheld_eur: Decimal,
    #[serde(skip)]
    pub conversion_rate_used: Option<Decimal>,
    #[serde(skip)]
    pub rate_date_used: Option<NaiveDate>,
}

/// Converts normalized events into the canonical EUR ledger, sorted by date.
/// Entries whose EUR value rounds to zero at two decimals are dropped here,
/// before any filing sees them.
pub fn assemble_ledger(
    events: Vec<RawEvent>,
    rates: &RateTable,
    diag: &mut DiagnosticLog,
) -> Vec<LedgerEntry> {
    let mut ledger = Vec::with_capacity(events.len());

    for event in events {
        let (value_eur, tax_eur, rate_used, rate_date) =
            match rates.rate(event.date, &event.native_currency) {
                RateLookup::Domestic => (event.gross_amount, event.tax_withheld, None, None),
                RateLookup::Found {
                    factor,
                    raw_rate,
                    date_used,
                } => {
                    let converted = event.gross_amount * factor;
                    diag.conversions.push(ConversionAudit {
                        date: event.date,
                        source: event.source.label().to_string(),
                        ticker: event.ticker.clone(),
                        original_amount: event.gross_amount,
                        currency: event.native_currency.clone(),
                        rate_date_used: date_used,
                        rate_value: raw_rate,
                        converted_value: converted,
                    });
                    (
                        converted,
                        event.tax_withheld * factor,
                        Some(raw_rate),
                        Some(date_used),
                    )
                }
                RateLookup::NotFound => {
                    diag.skip(
                        event.source.label(),
                        event.date,
                        SkipReason::NoRateFound,
                        format!(
                            "{} {} in {}",
                            event.kind.label(),
                            event.ticker,
                            event.native_currency
                        ),
                    );
                    (event.gross_amount, event.tax_withheld, None, None)
                }
            };

        if value_eur.round_dp(2) == Decimal::ZERO {
            diag.skip(
                event.source.label(),
                event.date,
                SkipReason::ZeroValue,
                format!("{} {}", event.kind.label(), event.ticker),
            );
            continue;
        }

        ledger.push(LedgerEntry {
            source: event.source,
            date: event.date,
            kind: event.kind,
            ticker: event.ticker,
            identifier: event.identifier,
            display_name: event.display_name,
            quantity: event.quantity,
            value_eur,
            tax_withheld_eur: tax_eur,
            conversion_rate_used: rate_used,
            rate_date_used: rate_date,
        });
    }

    // stable sort keeps same-day entries in import order
    ledger.sort_by_key(|entry| entry.date);

    info!("Assembled ledger with {} entries", ledger.len());
    ledger
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::services::events::CASH_TICKER;

    fn usd_rate_table() -> RateTable {
        let mut table = RateTable::empty();
        // raw ECB rate: 1 EUR buys 1.0869565... USD, so 1 USD ~ 0.92 EUR
        table.insert(
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            "USD",
            Decimal::ONE / dec!(0.92),
        );
        table.insert(
            NaiveDate::from_ymd_opt(2025, 5, 30).unwrap(),
            "USD",
            Decimal::ONE / dec!(0.90),
        );
        table
    }

    fn event(
        date: NaiveDate,
        kind: EventKind,
        ticker: &str,
        amount: Decimal,
        currency: &str,
    ) -> RawEvent {
        RawEvent {
            source: Source::Revolut,
            date,
            kind,
            ticker: ticker.to_string(),
            quantity: dec!(1),
            gross_amount: amount,
            native_currency: currency.to_string(),
            identifier: String::new(),
            display_name: ticker.to_string(),
            tax_withheld: Decimal::ZERO,
        }
    }

    #[test]
    fn domestic_amounts_pass_through_unchanged() {
        let rates = RateTable::empty();
        let mut diag = DiagnosticLog::new();
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();

        let ledger = assemble_ledger(
            vec![event(date, EventKind::Interest, CASH_TICKER, dec!(3.21), "EUR")],
            &rates,
            &mut diag,
        );

        assert_eq!(ledger[0].value_eur, dec!(3.21));
        assert!(ledger[0].conversion_rate_used.is_none());
        assert!(diag.conversions.is_empty());
    }

    #[test]
    fn foreign_amounts_convert_with_fallback_rate_date() {
        let rates = usd_rate_table();
        let mut diag = DiagnosticLog::new();

        // Sunday trade; nearest published rate is the preceding Friday
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let ledger = assemble_ledger(
            vec![event(sunday, EventKind::Buy, "AAPL", dec!(1000), "USD")],
            &rates,
            &mut diag,
        );

        assert_eq!(ledger[0].value_eur.round_dp(2), dec!(920.00));
        assert_eq!(
            ledger[0].rate_date_used,
            Some(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap())
        );
        assert_eq!(diag.conversions.len(), 1);
        assert_eq!(diag.conversions[0].currency, "USD");
    }

    #[test]
    fn unconvertible_entry_is_kept_native_and_flagged() {
        let rates = usd_rate_table();
        let mut diag = DiagnosticLog::new();
        let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();

        let ledger = assemble_ledger(
            vec![event(date, EventKind::Buy, "NESN", dec!(250), "CHF")],
            &rates,
            &mut diag,
        );

        assert_eq!(ledger[0].value_eur, dec!(250));
        assert!(ledger[0].conversion_rate_used.is_none());
        assert_eq!(diag.skips.len(), 1);
        assert_eq!(diag.skips[0].reason_code, "NO_RATE_FOUND");
    }

    #[test]
    fn near_zero_values_are_dropped_with_a_skip() {
        let rates = RateTable::empty();
        let mut diag = DiagnosticLog::new();
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();

        let ledger = assemble_ledger(
            vec![event(date, EventKind::Dividend, "AAPL", dec!(0.004), "EUR")],
            &rates,
            &mut diag,
        );

        assert!(ledger.is_empty());
        assert_eq!(diag.skips[0].reason_code, "ZERO_VALUE");
    }

    #[test]
    fn ledger_is_sorted_by_date_with_stable_same_day_order() {
        let rates = RateTable::empty();
        let mut diag = DiagnosticLog::new();
        let early = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let late = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        let ledger = assemble_ledger(
            vec![
                event(late, EventKind::Sell, "AAPL", dec!(100), "EUR"),
                event(early, EventKind::Buy, "AAPL", dec!(100), "EUR"),
                event(early, EventKind::Buy, "TSLA", dec!(100), "EUR"),
            ],
            &rates,
            &mut diag,
        );

        assert_eq!(ledger[0].ticker, "AAPL");
        assert_eq!(ledger[0].kind, EventKind::Buy);
        assert_eq!(ledger[1].ticker, "TSLA");
        assert_eq!(ledger[2].kind, EventKind::Sell);
    }

    #[test]
    fn buy_and_sell_scenario_converts_with_correct_rate_dates() {
        let mut rates = RateTable::empty();
        rates.insert(
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            "USD",
            Decimal::ONE / dec!(0.92),
        );
        rates.insert(
            NaiveDate::from_ymd_opt(2025, 5, 30).unwrap(),
            "USD",
            Decimal::ONE / dec!(0.90),
        );
        let mut diag = DiagnosticLog::new();

        let buy_date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let sell_date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let ledger = assemble_ledger(
            vec![
                event(buy_date, EventKind::Buy, "AAPL", dec!(1000), "USD"),
                event(sell_date, EventKind::Sell, "AAPL", dec!(1200), "USD"),
            ],
            &rates,
            &mut diag,
        );

        assert_eq!(ledger[0].value_eur.round_dp(2), dec!(920.00));
        assert_eq!(ledger[0].rate_date_used, Some(buy_date));
        // no rate published for the sell date itself
        assert_eq!(ledger[1].value_eur.round_dp(2), dec!(1080.00));
        assert_eq!(
            ledger[1].rate_date_used,
            Some(NaiveDate::from_ymd_opt(2025, 5, 30).unwrap())
        );
    }

    #[test]
    fn assembly_is_deterministic_for_identical_input() {
        let rates = usd_rate_table();
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let events = || {
            vec![
                event(date, EventKind::Buy, "AAPL", dec!(1000), "USD"),
                event(date, EventKind::Buy, "TSLA", dec!(500), "USD"),
            ]
        };

        let mut diag_a = DiagnosticLog::new();
        let mut diag_b = DiagnosticLog::new();
        let first = assemble_ledger(events(), &rates, &mut diag_a);
        let second = assemble_ledger(events(), &rates, &mut diag_b);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.ticker, b.ticker);
            assert_eq!(a.value_eur, b.value_eur);
        }
    }
}
