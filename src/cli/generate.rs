use owo_colors::OwoColorize;
use tabled::{Table, Tabled};

use super::shared::format_currency;
use crate::services::{
    diagnostics::DiagnosticLog,
    files::{read_ledger_csv, write_filing},
    filings::{
        capital_gains::build_capital_gains_filing, dividends::build_dividend_filing,
        interest::build_interest_filing, Filing,
    },
    shared::env::PipelineConfig,
};

#[derive(Tabled)]
struct FilingSummary {
    #[tabled(rename = "Filing")]
    name: &'static str,
    #[tabled(rename = "Records")]
    records: usize,
    #[tabled(rename = "Total")]
    total: String,
}

pub fn generate(config: &PipelineConfig, write_documents: bool) -> anyhow::Result<()> {
    let ledger = read_ledger_csv()?;
    let mut diag = DiagnosticLog::new();

    let filings: Vec<Filing> = vec![
        build_capital_gains_filing(&ledger, config, &mut diag),
        build_dividend_filing(&ledger, config, &mut diag),
        build_interest_filing(&ledger, config, &mut diag),
    ];

    if write_documents {
        for filing in &filings {
            let path = write_filing(filing)?;
            println!("{} {}", "Wrote".green(), path);
        }
    }

    let summary: Vec<FilingSummary> = filings
        .iter()
        .map(|filing| FilingSummary {
            name: filing.name,
            records: filing.record_count,
            total: format_currency(filing.total_eur),
        })
        .collect();

    println!("Filings for {}:", config.tax_year.bold());
    println!("{}", Table::new(&summary));

    if !diag.skips.is_empty() {
        println!("{}", "Records dropped during generation:".yellow());
        println!("{}", Table::new(&diag.skips));
    }

    Ok(())
}
