use anyhow::Context;
use clap::Parser;
use rask_event_tracker::app::{self, App, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    cli.resolve().context("invalid configuration")?;

    if let Err(e) = app::setup_logging(cli.config.log_level) {
        eprintln!("Warning: {e}");
    }

    let app = App::from_cli(cli).context("failed to build event tracker")?;
    let summary = app.run().await.context("event tracker failed")?;

    if summary.rejected > 0 {
        eprintln!("{} input line(s) were rejected", summary.rejected);
    }
    Ok(())
}
