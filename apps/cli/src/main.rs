//! repogov CLI: governance records kept as plain markdown in the repository.
//!
//! Tasks, human-in-the-loop items, waivers and agent logs live under
//! `.repo/`; every command here is a thin wrapper over `repogov-core`.

mod commands;

use std::process::ExitCode;

use clap::Parser;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    match commands::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
