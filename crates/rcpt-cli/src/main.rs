use clap::Parser;
use rcpt_core::logging;

mod cli;

use crate::cli::{Cli, Exit};

/// Conventional exit status for a run stopped with Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible.
    if let Some(path) = logging::init_logging(cli.verbose) {
        tracing::debug!("log file: {}", path.display());
    }

    match cli.command.execute() {
        Ok(Exit::Done) => {}
        Ok(Exit::Interrupted) => std::process::exit(EXIT_INTERRUPTED),
        Err(err) => {
            tracing::error!("fatal: {:#}", err);
            eprintln!("rcpt error: {:#}", err);
            std::process::exit(1);
        }
    }
}
