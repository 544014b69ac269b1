use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::Tabled;

/// Machine-readable reason a row or computed entry was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnrecognizedAction,
    MissingTicker,
    InvalidDate,
    NoRateFound,
    ZeroValue,
    IdentifierNotFound,
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::UnrecognizedAction => "UNRECOGNIZED_ACTION",
            SkipReason::MissingTicker => "MISSING_TICKER",
            SkipReason::InvalidDate => "INVALID_DATE",
            SkipReason::NoRateFound => "NO_RATE_FOUND",
            SkipReason::ZeroValue => "ZERO_VALUE",
            SkipReason::IdentifierNotFound => "IDENTIFIER_NOT_FOUND",
        }
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SkipRecord {
    pub source: String,
    pub row_reference: String,
    pub reason_code: String,
    pub raw_context: String,
}

/// One applied currency conversion, kept as proof for the tax office.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ConversionAudit {
    pub date: NaiveDate,
    pub source: String,
    pub ticker: String,
    pub original_amount: Decimal,
    pub currency: String,
    pub rate_date_used: NaiveDate,
    pub rate_value: Decimal,
    pub converted_value: Decimal,
}

/// Append-only side channel of the run. The pipeline only ever writes to it;
/// both streams are exported as CSV artifacts at the end.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    pub conversions: Vec<ConversionAudit>,
    pub skips: Vec<SkipRecord>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(
        &mut self,
        source: &str,
        row_reference: impl ToString,
        reason: SkipReason,
        raw_context: impl Into<String>,
    ) {
        self.skips.push(SkipRecord {
            source: source.to_string(),
            row_reference: row_reference.to_string(),
            reason_code: reason.code().to_string(),
            raw_context: raw_context.into(),
        });
    }
}
