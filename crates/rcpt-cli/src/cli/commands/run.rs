//! `rcpt run` – download every receipt in an export.

use anyhow::{bail, Context, Result};
use rcpt_core::config::RcptConfig;
use rcpt_core::fetch::FetchOutcome;
use rcpt_core::har::HarSession;
use rcpt_core::http::CurlClient;
use rcpt_core::interrupt::InterruptFlag;
use rcpt_core::pipeline::{Pipeline, ProgressEvent, RunPaths, RunReport, RunState};
use rcpt_core::session::{SessionFile, SessionSource};
use std::path::{Path, PathBuf};

use crate::cli::Exit;

/// Where the logged-in session comes from. Exactly one of `session`/`har` is set.
#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub session: Option<PathBuf>,
    pub har: Option<PathBuf>,
    pub har_host: Option<String>,
}

impl SessionArgs {
    fn open(self) -> Result<Box<dyn SessionSource>> {
        match (self.session, self.har) {
            (Some(path), None) => Ok(Box::new(SessionFile::new(path))),
            (None, Some(path)) => Ok(Box::new(HarSession::new(path, self.har_host))),
            _ => bail!("exactly one of --session or --har is required"),
        }
    }
}

pub fn run_receipts(
    cfg: RcptConfig,
    csv: &Path,
    download_dir: &Path,
    session: SessionArgs,
) -> Result<Exit> {
    let mut source = session.open()?;
    let interrupt = install_interrupt_handler()?;
    let paths = RunPaths::new(csv, download_dir);

    let mut pipeline = Pipeline::new(cfg, interrupt);
    let report = pipeline.run(&mut *source, CurlClient::new(), &paths, print_progress)?;
    print_summary(&report);

    Ok(match report.state {
        RunState::Completed => Exit::Done,
        RunState::Interrupted => Exit::Interrupted,
    })
}

/// First Ctrl-C asks the run to stop after the current receipt; a second one
/// exits immediately.
fn install_interrupt_handler() -> Result<InterruptFlag> {
    let interrupt = InterruptFlag::new();
    let flag = interrupt.clone();
    ctrlc::set_handler(move || {
        if flag.is_triggered() {
            std::process::exit(130);
        }
        flag.trigger();
        eprintln!("\nInterrupt received; finishing the current receipt and writing the export...");
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(interrupt)
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Started { rows, candidates } => {
            println!("Found {} receipt link(s) in {} row(s).", candidates, rows);
        }
        ProgressEvent::Downloading {
            index,
            total,
            filename,
            ..
        } => println!("[{}/{}] Downloading: {}", index, total, filename),
        ProgressEvent::Finished { outcome, .. } => match outcome {
            FetchOutcome::Success { path } => println!("  Saved: {}", path.display()),
            FetchOutcome::Failure { reason } => println!("  Failed: {}", reason),
        },
        ProgressEvent::LongBreak { delay, .. } => {
            println!("  Taking a short break ({:.1}s)...", delay.as_secs_f64());
        }
    }
}

fn print_summary(report: &RunReport) {
    if report.state == RunState::Interrupted {
        println!(
            "Interrupted: {} of {} receipt(s) processed, {} not attempted.",
            report.processed,
            report.candidates,
            report.skipped()
        );
    }
    println!(
        "Done: {} saved, {} failed. Receipts in {}",
        report.succeeded,
        report.failed,
        report.download_dir.display()
    );
    println!("Updated export: {}", report.output.display());
}
