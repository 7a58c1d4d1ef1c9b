mod app;
mod cli;
mod config;
mod document;
mod error;
mod logging;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::initialize(cli.log);
    app::run(cli).await?;
    Ok(())
}
