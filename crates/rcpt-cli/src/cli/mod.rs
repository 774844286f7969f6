//! CLI for rcpt, the receipt bulk fetcher.

mod commands;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use rcpt_core::config::{self, RetryConfig};
use std::path::PathBuf;

use commands::{run_plan, run_receipts, SessionArgs};

/// Top-level CLI for rcpt.
#[derive(Debug, Parser)]
#[command(name = "rcpt")]
#[command(about = "rcpt: bulk-download expense receipts with a logged-in browser session", long_about = None)]
pub struct Cli {
    /// Log everything at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every receipt linked from an expense export.
    #[command(group(ArgGroup::new("source").required(true).args(["session", "har"])))]
    Run {
        /// Expense export (CSV) with a receipt link column.
        csv: PathBuf,

        /// Session exported from the logged-in browser (JSON: user_agent + cookies).
        #[arg(long, value_name = "JSON")]
        session: Option<PathBuf>,

        /// HAR capture of the logged-in browser to take cookies and user-agent from.
        #[arg(long, value_name = "HAR")]
        har: Option<PathBuf>,

        /// Only use HAR requests to this host (and its subdomains).
        #[arg(long, value_name = "HOST", requires = "har")]
        har_host: Option<String>,

        /// Where receipts are written (default from config).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,

        /// Attempts per receipt, including the first (default from config).
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,

        /// Skip the one-off session check request before downloading.
        #[arg(long)]
        no_validate: bool,
    },

    /// Show which receipts a run would fetch and the names they would get.
    Plan {
        /// Expense export (CSV) with a receipt link column.
        csv: PathBuf,
    },
}

/// How the process should exit after a command that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Done,
    /// The user stopped the run; the export was still written.
    Interrupted,
}

impl CliCommand {
    pub fn execute(self) -> Result<Exit> {
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self {
            CliCommand::Run {
                csv,
                session,
                har,
                har_host,
                download_dir,
                max_attempts,
                no_validate,
            } => {
                if let Some(n) = max_attempts {
                    cfg.retry = Some(RetryConfig {
                        max_attempts: n,
                        ..cfg.retry_or_default()
                    });
                }
                if no_validate {
                    cfg.validation_url.clear();
                }
                let download_dir = download_dir.unwrap_or_else(|| cfg.download_dir.clone());
                let source = SessionArgs {
                    session,
                    har,
                    har_host,
                };
                run_receipts(cfg, &csv, &download_dir, source)
            }
            CliCommand::Plan { csv } => {
                run_plan(&cfg, &csv)?;
                Ok(Exit::Done)
            }
        }
    }
}

#[cfg(test)]
mod tests;
