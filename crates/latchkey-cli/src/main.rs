use anyhow::Context;
use clap::Parser;
use latchkey_cli::{Cli, Settings, commands, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli).context("Failed to load configuration")?;

    let subscriber = logging::get_subscriber(
        "latchkey",
        &settings.log.level,
        settings.log.format,
        std::io::stderr,
    );
    logging::init_subscriber(subscriber)?;
    latchkey_core::describe_metrics();

    let code = commands::execute(cli.command, &settings).await?;
    std::process::exit(code);
}
