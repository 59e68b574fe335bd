use anyhow::Result;
use clap::Parser;
use wai_intake::{Cli, Command, IntakeConfig, history, run};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    wai_telemetry::install("wai-intake")?;

    match cli.command {
        Some(Command::History(args)) => history::run(args).await,
        Some(Command::Serve(args)) => run(IntakeConfig::from(args)).await,
        None => run(IntakeConfig::from(cli.serve)).await,
    }
}
