use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::services::{
    diagnostics::{DiagnosticLog, SkipReason},
    events::{RawEvent, CASH_TICKER},
};

/// External security-identifier lookup. Consulted at most once per distinct
/// ticker per run; failures stay failed for the rest of the run.
#[allow(async_fn_in_trait)]
pub trait IdentifierResolver {
    async fn lookup(&self, ticker: &str) -> anyhow::Result<Option<String>>;
}

/// Run-scoped memo of resolution results. Written here, read by the ledger
/// assembly only through the identifiers already stamped onto the events.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    resolved: HashMap<String, String>,
    searched: HashSet<String>,
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    #[cfg(test)]
    pub fn lookup_attempted(&self, ticker: &str) -> bool {
        self.searched.contains(ticker)
    }
}

/// Manual ticker -> identifier assignment, checked before any remote call.
#[derive(Debug, Deserialize)]
pub struct IdentifierOverride {
    pub ticker: String,
    pub identifier: String,
}

/// Reads the optional override table. A missing file simply means no
/// overrides.
pub fn load_identifier_overrides(path: &Path) -> anyhow::Result<Vec<IdentifierOverride>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut rdr = csv::Reader::from_path(path)?;
    let mut overrides = Vec::new();
    for result in rdr.deserialize() {
        let record: IdentifierOverride = result?;
        overrides.push(record);
    }
    info!("Loaded {} identifier overrides", overrides.len());
    Ok(overrides)
}

fn participates(event: &RawEvent) -> bool {
    event.kind.carries_security() && event.ticker != CASH_TICKER && !event.ticker.is_empty()
}

/// Fills missing identifiers across all events. Resolution order per ticker:
/// an identifier already present on any event for that ticker, then the
/// manual override table, then the remote resolver. The ticker is the join
/// key since most providers ship no identifier at all.
pub async fn resolve_identifiers(
    events: &mut [RawEvent],
    overrides: &[IdentifierOverride],
    resolver: &impl IdentifierResolver,
    diag: &mut DiagnosticLog,
) -> IdentifierCache {
    let mut cache = IdentifierCache::new();

    // identifiers carried by the input are the source of truth
    for event in events.iter() {
        if participates(event) && !event.identifier.is_empty() {
            cache
                .resolved
                .entry(event.ticker.clone())
                .or_insert_with(|| event.identifier.clone());
        }
    }

    for item in overrides {
        cache
            .resolved
            .entry(item.ticker.clone())
            .or_insert_with(|| item.identifier.clone());
    }

    for event in events.iter_mut() {
        if !participates(event) || !event.identifier.is_empty() {
            continue;
        }

        if let Some(known) = cache.resolved.get(&event.ticker) {
            event.identifier = known.clone();
            continue;
        }

        // a ticker that already failed this run is not retried
        if cache.searched.contains(&event.ticker) {
            continue;
        }
        cache.searched.insert(event.ticker.clone());

        match resolver.lookup(&event.ticker).await {
            Ok(Some(identifier)) => {
                cache
                    .resolved
                    .insert(event.ticker.clone(), identifier.clone());
                event.identifier = identifier;
            }
            Ok(None) => {
                diag.skip(
                    "IDENTIFIER_CHECK",
                    "N/A",
                    SkipReason::IdentifierNotFound,
                    format!("Ticker: {}", event.ticker),
                );
            }
            Err(err) => {
                diag.skip(
                    "IDENTIFIER_CHECK",
                    "N/A",
                    SkipReason::IdentifierNotFound,
                    format!("Ticker: {} ({})", event.ticker, err),
                );
            }
        }
    }

    cache
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use anyhow::anyhow;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::services::events::{EventKind, Source};

    struct StubResolver {
        answers: HashMap<String, Option<String>>,
        calls: RefCell<Vec<String>>,
    }

    impl StubResolver {
        fn new(answers: &[(&str, Option<&str>)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn call_count(&self, ticker: &str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|called| called.as_str() == ticker)
                .count()
        }
    }

    impl IdentifierResolver for StubResolver {
        async fn lookup(&self, ticker: &str) -> anyhow::Result<Option<String>> {
            self.calls.borrow_mut().push(ticker.to_string());
            match self.answers.get(ticker) {
                Some(answer) => Ok(answer.clone()),
                None => Err(anyhow!("resolver offline")),
            }
        }
    }

    fn event(kind: EventKind, ticker: &str, identifier: &str) -> RawEvent {
        RawEvent {
            source: Source::Revolut,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            kind,
            ticker: ticker.to_string(),
            quantity: dec!(1),
            gross_amount: dec!(100),
            native_currency: "USD".to_string(),
            identifier: identifier.to_string(),
            display_name: ticker.to_string(),
            tax_withheld: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn propagates_known_identifiers_across_ticker() {
        let mut events = vec![
            event(EventKind::Buy, "AAPL", "US0378331005"),
            event(EventKind::Sell, "AAPL", ""),
            event(EventKind::Dividend, "AAPL", ""),
        ];
        let resolver = StubResolver::new(&[]);
        let mut diag = DiagnosticLog::new();

        resolve_identifiers(&mut events, &[], &resolver, &mut diag).await;

        for entry in &events {
            assert_eq!(entry.identifier, "US0378331005");
        }
        assert_eq!(resolver.calls.borrow().len(), 0);
    }

    #[tokio::test]
    async fn override_table_wins_before_any_remote_call() {
        let mut events = vec![event(EventKind::Buy, "VWCE", "")];
        let overrides = vec![IdentifierOverride {
            ticker: "VWCE".to_string(),
            identifier: "IE00BK5BQT80".to_string(),
        }];
        let resolver = StubResolver::new(&[("VWCE", Some("WRONG"))]);
        let mut diag = DiagnosticLog::new();

        resolve_identifiers(&mut events, &overrides, &resolver, &mut diag).await;

        assert_eq!(events[0].identifier, "IE00BK5BQT80");
        assert_eq!(resolver.call_count("VWCE"), 0);
    }

    #[tokio::test]
    async fn remote_lookup_is_memoized_per_ticker() {
        let mut events = vec![
            event(EventKind::Buy, "TSLA", ""),
            event(EventKind::Sell, "TSLA", ""),
            event(EventKind::Buy, "TSLA", ""),
        ];
        let resolver = StubResolver::new(&[("TSLA", Some("US88160R1014"))]);
        let mut diag = DiagnosticLog::new();

        resolve_identifiers(&mut events, &[], &resolver, &mut diag).await;

        assert_eq!(resolver.call_count("TSLA"), 1);
        for entry in &events {
            assert_eq!(entry.identifier, "US88160R1014");
        }
    }

    #[tokio::test]
    async fn failed_lookup_is_recorded_and_not_retried() {
        let mut events = vec![
            event(EventKind::Buy, "OBSCURE", ""),
            event(EventKind::Sell, "OBSCURE", ""),
        ];
        let resolver = StubResolver::new(&[("OBSCURE", None)]);
        let mut diag = DiagnosticLog::new();

        let cache = resolve_identifiers(&mut events, &[], &resolver, &mut diag).await;

        assert_eq!(resolver.call_count("OBSCURE"), 1);
        assert!(cache.lookup_attempted("OBSCURE"));
        assert!(events.iter().all(|entry| entry.identifier.is_empty()));
        assert_eq!(diag.skips.len(), 1);
        assert_eq!(diag.skips[0].reason_code, "IDENTIFIER_NOT_FOUND");
    }

    #[tokio::test]
    async fn cash_and_interest_are_excluded_from_resolution() {
        let mut events = vec![event(EventKind::Interest, CASH_TICKER, "")];
        let resolver = StubResolver::new(&[]);
        let mut diag = DiagnosticLog::new();

        resolve_identifiers(&mut events, &[], &resolver, &mut diag).await;

        assert!(resolver.calls.borrow().is_empty());
        assert!(events[0].identifier.is_empty());
    }
}
