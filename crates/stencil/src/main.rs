use std::process::ExitCode;

use clap::Parser;
use stencil::{logging, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level());

    match stencil::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "render failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
