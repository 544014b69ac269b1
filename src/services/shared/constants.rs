pub const IN_DIR: &str = "./in";
pub const OUT_DIR: &str = "./out";

pub const REPORTING_CURRENCY: &str = "EUR";

/// How many days before the requested date the rate lookup may fall back to.
/// ECB publishes no reference rates on weekends and holidays.
pub const RATE_LOOKBACK_DAYS: i64 = 4;

/// Currencies the ECB rate source is queried for. Broker exports denominated
/// outside this list end up as NoRateFound entries in the skip table.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "USD", "GBP", "CHF", "SEK", "NOK", "DKK", "PLN", "CZK", "HUF", "RON", "JPY", "CAD", "AUD",
];

pub const LEDGER_FILE: &str = "master_ledger";
pub const AUDIT_FILE: &str = "audit_rates";
pub const SKIPPED_FILE: &str = "audit_skipped";

/// Optional manual ticker -> identifier table, read from the input directory.
pub const OVERRIDES_FILE: &str = "identifier_overrides.csv";
