use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use spinners_rs::{Spinner, Spinners};
use tracing::warn;

use crate::services::shared::constants::{
    RATE_LOOKBACK_DAYS, REPORTING_CURRENCY, SUPPORTED_CURRENCIES,
};

/// Daily ECB reference rates, expressed as foreign units per 1 EUR. Built
/// once per run and read-only afterwards.
#[derive(Debug, Default)]
pub struct RateTable {
    rates: BTreeMap<NaiveDate, HashMap<String, Decimal>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLookup {
    /// Amount is already in the reporting currency, factor is 1.
    Domestic,
    /// `factor` converts a native amount into EUR (1 / raw ECB rate).
    Found {
        factor: Decimal,
        raw_rate: Decimal,
        date_used: NaiveDate,
    },
    /// No usable rate within the look-back window. The caller must not guess.
    NotFound,
}

impl RateTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, currency: &str, rate: Decimal) {
        self.rates
            .entry(date)
            .or_default()
            .insert(currency.to_string(), rate);
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Value of 1 unit of `currency` in EUR as of `date`, falling back up to
    /// four days for weekends and holidays. GBX (pence sterling) resolves
    /// via GBP with the x100 adjustment.
    pub fn rate(&self, date: NaiveDate, currency: &str) -> RateLookup {
        if currency == REPORTING_CURRENCY {
            return RateLookup::Domestic;
        }

        let (lookup_currency, gbx_adjustment_needed) = if currency == "GBX" {
            ("GBP", true)
        } else {
            (currency, false)
        };

        for offset in 0..=RATE_LOOKBACK_DAYS {
            let candidate = date - Duration::days(offset);
            let Some(day_rates) = self.rates.get(&candidate) else {
                continue;
            };
            let Some(&raw) = day_rates.get(lookup_currency) else {
                continue;
            };
            if raw == Decimal::ZERO {
                continue;
            }

            let raw_rate = if gbx_adjustment_needed {
                raw * dec!(100)
            } else {
                raw
            };
            return RateLookup::Found {
                factor: Decimal::ONE / raw_rate,
                raw_rate,
                date_used: candidate,
            };
        }

        RateLookup::NotFound
    }
}

/// External provider of the historical rate table. Consumed once per run.
#[allow(async_fn_in_trait)]
pub trait RateSource {
    async fn fetch(&self) -> anyhow::Result<RateTable>;
}

pub struct EcbRateSource;

impl RateSource for EcbRateSource {
    async fn fetch(&self) -> anyhow::Result<RateTable> {
        let mut sp = Spinner::new(Spinners::Point, "Fetching historic FX rates from ECB");
        sp.start();

        let client = Client::new();
        let mut table = RateTable::empty();

        for currency in SUPPORTED_CURRENCIES {
            let res = client
                .get(format!(
                    "https://data.ecb.europa.eu/data-detail-api/EXR.D.{}.EUR.SP00.A",
                    currency
                ))
                .send()
                .await?;

            let body = res.text().await?;
            let data: Value = serde_json::from_str(&body)?;

            let Some(observations) = data.as_array() else {
                warn!("Unexpected ECB response shape for {}", currency);
                continue;
            };

            for observation in observations {
                let Some(date_str) = observation["PERIOD"].as_str() else {
                    continue;
                };
                let date = NaiveDate::from_str(date_str)?;
                let rate = observation["OBS"]
                    .as_str()
                    .unwrap_or("0.0")
                    .parse::<Decimal>()
                    .unwrap_or(Decimal::ZERO);

                // days without a published rate come through as zero
                if rate != dec!(0.0) {
                    table.insert(date, currency, rate);
                }
            }
        }

        sp.stop();
        Ok(table)
    }
}

/// Failure to obtain rates degrades the run to "no conversions available";
/// every later lookup then fails closed as NotFound instead of aborting.
pub async fn load_rate_table(source: &impl RateSource) -> RateTable {
    match source.fetch().await {
        Ok(table) => table,
        Err(err) => {
            warn!(
                "Could not load FX rates ({}), foreign amounts will be kept unconverted and flagged",
                err
            );
            RateTable::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_friday_rate() -> RateTable {
        let mut table = RateTable::empty();
        // 2025-01-03 is a Friday
        table.insert(
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            "USD",
            dec!(1.05),
        );
        table
    }

    #[test]
    fn reporting_currency_is_always_domestic() {
        let table = RateTable::empty();
        let date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(table.rate(date, "EUR"), RateLookup::Domestic);
    }

    #[test]
    fn weekend_requests_fall_back_to_friday() {
        let table = table_with_friday_rate();
        let friday = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();

        for day in 4..=6 {
            let requested = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
            match table.rate(requested, "USD") {
                RateLookup::Found {
                    factor,
                    raw_rate,
                    date_used,
                } => {
                    assert_eq!(date_used, friday);
                    assert_eq!(raw_rate, dec!(1.05));
                    assert_eq!(factor, Decimal::ONE / dec!(1.05));
                }
                other => panic!("expected Found, got {:?}", other),
            }
        }
    }

    #[test]
    fn lookback_window_is_bounded() {
        let table = table_with_friday_rate();
        // five days after the last available rate is out of the window
        let requested = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        assert_eq!(table.rate(requested, "USD"), RateLookup::NotFound);
    }

    #[test]
    fn unknown_currency_fails_closed() {
        let table = table_with_friday_rate();
        let friday = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(table.rate(friday, "XXX"), RateLookup::NotFound);
    }

    #[test]
    fn zero_rates_are_ignored() {
        let mut table = table_with_friday_rate();
        let saturday = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap();
        table.insert(saturday, "USD", Decimal::ZERO);

        match table.rate(saturday, "USD") {
            RateLookup::Found { date_used, .. } => {
                assert_eq!(date_used, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
            }
            other => panic!("expected fallback to Friday, got {:?}", other),
        }
    }

    #[test]
    fn gbx_resolves_via_gbp_with_pence_adjustment() {
        let mut table = RateTable::empty();
        let date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        table.insert(date, "GBP", dec!(0.85));

        match table.rate(date, "GBX") {
            RateLookup::Found {
                factor, raw_rate, ..
            } => {
                assert_eq!(raw_rate, dec!(85));
                assert_eq!(factor, Decimal::ONE / dec!(85));
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn empty_table_degrades_to_not_found() {
        let table = RateTable::empty();
        let date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(table.rate(date, "USD"), RateLookup::NotFound);
    }
}
