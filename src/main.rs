mod cli;
mod services;

use cli::cli;
use services::{
    files::create_necessary_directories,
    shared::{env::check_for_env_variables, logger::init_logger},
};

async fn run_filingbox() -> anyhow::Result<()> {
    init_logger();
    check_for_env_variables();
    create_necessary_directories();
    cli().await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    run_filingbox().await?;
    Ok(())
}
