//! `gocd`: command-line client for the GoCD REST API.

use clap::Parser;
use std::process::ExitCode;

use gocd_provider::cli::{self, Cli};
use gocd_provider::init_logging_with_default;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging_with_default(&cli.log_level);

    let mut stdout = std::io::stdout().lock();
    ExitCode::from(cli::run(cli, &mut stdout).await)
}
