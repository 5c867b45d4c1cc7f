//! Lean CLI binary.

use std::process::ExitCode;

use colored::Colorize;
use lean::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Exit status for problems with what the user passed in.
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Logs go to stderr so JSON output on stdout stays clean.
    // RUST_LOG overrides the -v level, e.g. RUST_LOG=lean_graph=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting lean CLI");

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }

            let input_error = e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<lean_graph::Error>())
                .any(lean_graph::Error::is_input_error);
            if input_error {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
