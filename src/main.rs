#![forbid(unsafe_code)]

//! mdav: MD Artifact Verifier CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        // The report already carries the verdict.
        if !matches!(e, cli_app::CliError::NotReady(_)) {
            eprintln!("mdav: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
