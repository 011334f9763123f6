use clap::Parser;
use infrastructure::config::Config;
use presentation::cli::{Cli, CliApp};
use shared::status_line::StatusLine;
use shared::telemetry::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let status = StatusLine::new();
    init_logging(cli.verbose, status.writer(std::io::stderr));
    let mut app = CliApp::new(Config::load(), status);
    app.run(cli).await?;
    Ok(())
}
