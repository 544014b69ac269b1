use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use tabled::Table;
use tracing::info;
use walkdir::WalkDir;

use crate::services::{
    diagnostics::DiagnosticLog,
    events::RawEvent,
    files::export_csv,
    importers::extract_events,
    instruments::identifiers::{load_identifier_overrides, resolve_identifiers},
    market_data::{
        fx_rates::{load_rate_table, EcbRateSource},
        openfigi::OpenFigiResolver,
    },
    ledger::assemble_ledger,
    shared::constants::{AUDIT_FILE, IN_DIR, LEDGER_FILE, OVERRIDES_FILE, SKIPPED_FILE},
};

pub async fn prepare(directory_path: Option<&str>) -> anyhow::Result<()> {
    let directory_path = directory_path.unwrap_or(IN_DIR);

    let mut diag = DiagnosticLog::new();
    let mut events: Vec<RawEvent> = Vec::new();

    for entry in WalkDir::new(directory_path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let file_path = entry.path();
        if file_path.extension() != Some(OsStr::new("csv")) {
            continue;
        }
        if file_path.file_name() == Some(OsStr::new(OVERRIDES_FILE)) {
            continue;
        }

        info!(target: "prepare", "Reading {:?}", file_path);

        match fs::read_to_string(file_path) {
            Ok(content) => match extract_events(&content, &mut diag) {
                Ok(mut extracted) => events.append(&mut extracted),
                Err(e) => {
                    eprintln!("Failed to process {}: {:?}", file_path.display(), e);
                    continue;
                }
            },
            Err(e) => {
                eprintln!("Failed to read {}: {:?}", file_path.display(), e);
                continue;
            }
        }
    }
    println!("Adapted {} events from {}", events.len(), directory_path);

    let overrides =
        load_identifier_overrides(&Path::new(directory_path).join(OVERRIDES_FILE))?;
    let cache =
        resolve_identifiers(&mut events, &overrides, &OpenFigiResolver::new(), &mut diag).await;
    println!("Resolved identifiers for {} tickers", cache.resolved_count());

    let rates = load_rate_table(&EcbRateSource).await;
    if rates.is_empty() {
        println!("No FX rates available, foreign amounts will be flagged in the skip table.");
    }
    let ledger = assemble_ledger(events, &rates, &mut diag);

    export_csv(&ledger, LEDGER_FILE)?;
    if !diag.conversions.is_empty() {
        export_csv(&diag.conversions, AUDIT_FILE)?;
    }
    if !diag.skips.is_empty() {
        export_csv(&diag.skips, SKIPPED_FILE)?;
        println!("Skipped rows:");
        println!("{}", Table::new(&diag.skips));
    }

    println!("Master ledger written with {} entries.", ledger.len());
    Ok(())
}
