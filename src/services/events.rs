use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentinel ticker for events without an underlying security, e.g. interest
/// on uninvested cash. Keeps cash events alive through ticker-based grouping.
pub const CASH_TICKER: &str = "CASH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Trading212,
    Revolut,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Trading212 => "Trading212",
            Source::Revolut => "Revolut",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Buy,
    Sell,
    Dividend,
    Interest,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Buy => "BUY",
            EventKind::Sell => "SELL",
            EventKind::Dividend => "DIVIDEND",
            EventKind::Interest => "INTEREST",
        }
    }

    /// Kinds that carry a security and therefore participate in identifier
    /// resolution. Interest is cash-only and explicitly excluded.
    pub fn carries_security(&self) -> bool {
        matches!(
            self,
            EventKind::Buy | EventKind::Sell | EventKind::Dividend
        )
    }
}

/// One normalized broker event in its native currency. Quantity and amounts
/// are absolute values; direction lives in `kind` only.
#[derive(Debug, Clone, Serialize)]
pub struct RawEvent {
    pub source: Source,
    pub date: NaiveDate,
    pub kind: EventKind,
    pub ticker: String,
    pub quantity: Decimal,
    pub gross_amount: Decimal,
    pub native_currency: String,
    pub identifier: String,
    pub display_name: String,
    pub tax_withheld: Decimal,
}
