//! Logging init: file under the XDG state dir, falling back to stderr.
//!
//! Progress meant for the person running the tool is printed by the CLI;
//! everything here goes to the log so a long run can be audited afterwards.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,rcpt=debug,rcpt_core=debug,rcpt_cli=debug";

/// Writer that is either the log file or stderr (used when cloning the handle fails).
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct SharedLogFile(fs::File);

impl<'a> MakeWriter<'a> for SharedLogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

/// `~/.local/state/rcpt/rcpt.log`, creating the directory if needed.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rcpt")?;
    Ok(xdg_dirs.place_state_file("rcpt.log")?)
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize structured logging to the state-dir log file.
///
/// Returns the log path on success. If the file cannot be opened, logging goes
/// to stderr instead and `None` is returned; a run is never blocked on log setup.
pub fn init_logging(verbose: bool) -> Option<PathBuf> {
    match open_log_file() {
        Ok((path, file)) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose))
                .with_writer(BoxMakeWriter::new(SharedLogFile(file)))
                .with_ansi(false)
                .init();
            tracing::info!("rcpt logging initialized at {}", path.display());
            Some(path)
        }
        Err(err) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose))
                .with_writer(io::stderr)
                .with_ansi(false)
                .init();
            tracing::warn!("log file unavailable ({err:#}); logging to stderr");
            None
        }
    }
}

fn open_log_file() -> Result<(PathBuf, fs::File)> {
    let path = log_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}
