pub mod generate;
pub mod prepare;
pub mod shared;

use clap::{Parser, Subcommand};
use generate::generate;
use prepare::prepare;

use crate::services::shared::env::load_config;

#[derive(Parser, Debug)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,
    /// Reporting year; defaults to TAX_YEAR or the previous calendar year
    #[arg(short, long, global = true)]
    year: Option<i32>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan a directory of broker exports and build the master ledger
    Prepare { path: Option<String> },
    /// Build the filing documents from the master ledger
    Generate {},
    /// Print the filing summary without writing any documents
    Stats {},
}

pub async fn cli() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args.year);

    match args.cmd {
        Command::Prepare { path } => {
            prepare(path.as_deref()).await?;
        }
        Command::Generate {} => {
            generate(&config, true)?;
        }
        Command::Stats {} => {
            generate(&config, false)?;
        }
    }
    Ok(())
}
