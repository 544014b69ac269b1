pub mod diagnostics;
pub mod events;
pub mod files;
pub mod filings;
pub mod importers;
pub mod instruments;
pub mod ledger;
pub mod market_data;
pub mod parsers;
pub mod shared;
