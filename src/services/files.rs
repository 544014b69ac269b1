use std::{
    fs::{self, File},
    path::Path,
};

use csv::Writer;
use serde::Serialize;

use super::{
    filings::Filing,
    ledger::LedgerEntry,
    shared::constants::{IN_DIR, LEDGER_FILE, OUT_DIR},
};

fn create_dir_if_nonexistent(directory_path: &str) {
    let path = Path::new(directory_path);
    if !path.exists() {
        fs::create_dir_all(path).unwrap();
        println!("Folder created at: {:?}", path);
    }
}

pub fn create_necessary_directories() {
    create_dir_if_nonexistent(OUT_DIR);
    create_dir_if_nonexistent(IN_DIR);
}

pub fn export_csv<T>(rows: &Vec<T>, file_name: &str) -> anyhow::Result<()>
where
    T: Serialize,
{
    let file = File::create(format!("{}/{}.csv", OUT_DIR, file_name))?;
    let mut wtr = Writer::from_writer(file);

    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush()?;

    Ok(())
}

pub fn write_filing(filing: &Filing) -> anyhow::Result<String> {
    let path = format!("{}/{}", OUT_DIR, filing.file_name);
    fs::write(&path, filing.envelope.to_pretty_string())?;
    Ok(path)
}

/// Reads the master ledger back. The ledger CSV is the interchange contract
/// between the prepare and generate stages.
pub fn read_ledger_csv() -> anyhow::Result<Vec<LedgerEntry>> {
    let path = format!("{}/{}.csv", OUT_DIR, LEDGER_FILE);
    let mut rdr = csv::Reader::from_path(&path)?;

    let mut entries = Vec::new();
    for result in rdr.deserialize() {
        let entry: LedgerEntry = result?;
        entries.push(entry);
    }
    Ok(entries)
}
