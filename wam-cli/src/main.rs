//! WAM CLI - builds water allocation model inputs and stream depletion series.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wam-cli",
    version,
    about = "Water allocation model toolkit: stream depletion, consents and low-flow bands"
)]
struct Cli {
    #[command(subcommand)]
    command: wam_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("wam-cli {}", env!("CARGO_PKG_VERSION"));
    wam_cmd::run(cli.command)
}
