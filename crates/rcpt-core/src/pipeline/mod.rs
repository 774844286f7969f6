//! Run orchestration: session bridge → export → sequential receipt downloads
//! → augmented export.
//!
//! A run moves through init, table load, download loop and reconciliation.
//! Session and table problems abort it before anything is downloaded; per-row
//! failures are recorded and the loop moves on. A manual interrupt stops the
//! loop, and the rows processed so far are still written out.

mod pacing;
mod plan;

pub use pacing::Pause;
pub use plan::{plan, PlannedReceipt, RunPlan};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::any::Any;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::RcptConfig;
use crate::fetch::{FetchOutcome, RetryingFetcher};
use crate::http::HttpClient;
use crate::interrupt::InterruptFlag;
use crate::ledger::Ledger;
use crate::naming::FilenameBuilder;
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::session::{self, SessionError, SessionSource};
use crate::table::{augmented_path, DownloadCandidate, RowId, Table, TableError};

use pacing::{sleep_interruptibly, Pacing};

/// How the download loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Every candidate was processed.
    Completed,
    /// Stopped by the user; later candidates were not attempted.
    Interrupted,
}

/// Errors that abort a run. Per-row download failures are never reported here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("session setup failed: {0}")]
    Setup(#[from] SessionError),
    #[error("cannot load export {}: {source}", path.display())]
    TableLoad { path: PathBuf, source: TableError },
    #[error("cannot create download directory {}: {source}", path.display())]
    Prepare { path: PathBuf, source: io::Error },
    #[error("cannot write {}: {source}", path.display())]
    Output { path: PathBuf, source: TableError },
}

/// Input, download directory and output locations of one run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub input: PathBuf,
    pub download_dir: PathBuf,
    pub output: PathBuf,
}

impl RunPaths {
    /// Output defaults to `<input stem>_with_filenames.csv` next to the input.
    pub fn new(input: impl Into<PathBuf>, download_dir: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = augmented_path(&input);
        Self {
            input,
            download_dir: download_dir.into(),
            output,
        }
    }
}

/// Progress notifications for the caller (the CLI prints them).
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Started {
        rows: usize,
        candidates: usize,
    },
    /// About to fetch candidate `index` (1-based) of `total`.
    Downloading {
        index: usize,
        total: usize,
        row: RowId,
        filename: String,
    },
    Finished {
        row: RowId,
        outcome: FetchOutcome,
    },
    LongBreak {
        after: usize,
        delay: Duration,
    },
}

/// Summary of a run that got as far as writing its output.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    /// Rows in the export.
    pub rows: usize,
    /// Rows with a receipt link.
    pub candidates: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub output: PathBuf,
    pub download_dir: PathBuf,
}

impl RunReport {
    /// Candidates never attempted because of an interrupt.
    pub fn skipped(&self) -> usize {
        self.candidates - self.processed
    }
}

/// Sequential receipt downloader. One instance per run.
pub struct Pipeline<S = ThreadSleeper, R = StdRng> {
    cfg: RcptConfig,
    interrupt: InterruptFlag,
    sleeper: S,
    rng: R,
}

impl Pipeline {
    /// Real sleeps and an entropy-seeded RNG.
    pub fn new(cfg: RcptConfig, interrupt: InterruptFlag) -> Self {
        Self::with_parts(cfg, interrupt, ThreadSleeper, StdRng::from_entropy())
    }
}

impl<S: Sleeper, R: Rng> Pipeline<S, R> {
    pub fn with_parts(cfg: RcptConfig, interrupt: InterruptFlag, sleeper: S, rng: R) -> Self {
        Self {
            cfg,
            interrupt,
            sleeper,
            rng,
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Runs the whole pipeline against `source`, sending requests through
    /// `transport`.
    ///
    /// The session is released at the end whatever the result; after a run
    /// that reached its output, the configured grace delay is waited first.
    pub fn run<Src, C, P>(
        &mut self,
        source: &mut Src,
        transport: C,
        paths: &RunPaths,
        mut progress: P,
    ) -> Result<RunReport, PipelineError>
    where
        Src: SessionSource + ?Sized,
        C: HttpClient,
        P: FnMut(&ProgressEvent),
    {
        let result = self.run_bridged(&*source, transport, paths, &mut progress);
        if result.is_ok() {
            let grace = Pacing::new(self.cfg.pacing_or_default()).release_grace();
            if sleep_interruptibly(&mut self.sleeper, grace, &self.interrupt).is_err() {
                tracing::debug!("grace delay cut short by interrupt");
            }
        }
        source.release();
        tracing::debug!("session released");
        result
    }

    fn run_bridged<Src, C, P>(
        &mut self,
        source: &Src,
        transport: C,
        paths: &RunPaths,
        progress: &mut P,
    ) -> Result<RunReport, PipelineError>
    where
        Src: SessionSource + ?Sized,
        C: HttpClient,
        P: FnMut(&ProgressEvent),
    {
        tracing::debug!("init: bridging session");
        let client = session::bridge(
            source,
            transport,
            &self.cfg.validation_url,
            self.cfg.validation_timeout(),
        )?;

        tracing::debug!("loading export {}", paths.input.display());
        let table_err = |source| PipelineError::TableLoad {
            path: paths.input.clone(),
            source,
        };
        let table = Table::load(&paths.input).map_err(table_err)?;
        let candidates = table.candidates(&self.cfg.link_column).map_err(table_err)?;
        fs::create_dir_all(&paths.download_dir).map_err(|source| PipelineError::Prepare {
            path: paths.download_dir.clone(),
            source,
        })?;
        tracing::info!(
            rows = table.len(),
            candidates = candidates.len(),
            dir = %paths.download_dir.display(),
            "starting downloads"
        );
        progress(&ProgressEvent::Started {
            rows: table.len(),
            candidates: candidates.len(),
        });

        let builder = FilenameBuilder::for_table(&table, &self.cfg);
        let fetcher = RetryingFetcher::new(
            client,
            RetryPolicy::from_config(&self.cfg.retry_or_default()),
            self.cfg.request_timeout(),
        )
        .with_interrupt(self.interrupt.clone());
        let pacing = Pacing::new(self.cfg.pacing_or_default());
        let mut ledger = Ledger::new();
        let mut state = RunState::Completed;
        let total = candidates.len();

        for (i, candidate) in candidates.iter().enumerate() {
            if self.interrupt.is_triggered() {
                state = RunState::Interrupted;
                break;
            }
            let row = candidate.record.id();
            let outcome = self.process(
                &fetcher,
                &builder,
                candidate,
                &paths.download_dir,
                i + 1,
                total,
                progress,
            );
            ledger.record(row, &outcome);
            progress(&ProgressEvent::Finished { row, outcome });

            if i + 1 == total {
                break;
            }
            let pause = pacing.pause_after(i + 1, &mut self.rng);
            if let Pause::Long(delay) = pause {
                tracing::debug!(after = i + 1, ?delay, "long break");
                progress(&ProgressEvent::LongBreak { after: i + 1, delay });
            }
            if sleep_interruptibly(&mut self.sleeper, pause.duration(), &self.interrupt).is_err() {
                state = RunState::Interrupted;
                break;
            }
        }
        if state == RunState::Interrupted {
            tracing::warn!(processed = ledger.len(), total, "run interrupted");
        }

        tracing::debug!("reconciling {} outcome(s)", ledger.len());
        let augmented = ledger.materialize(&table, &self.cfg.output_column);
        augmented
            .write(&paths.output)
            .map_err(|source| PipelineError::Output {
                path: paths.output.clone(),
                source,
            })?;
        tracing::info!(output = %paths.output.display(), "augmented export written");

        Ok(RunReport {
            state,
            rows: table.len(),
            candidates: total,
            processed: ledger.len(),
            succeeded: ledger.succeeded(),
            failed: ledger.failed(),
            output: paths.output.clone(),
            download_dir: paths.download_dir.clone(),
        })
    }

    /// Names and fetches one candidate. Never panics: a panic in either step
    /// becomes a failure for this row only.
    #[allow(clippy::too_many_arguments)]
    fn process<C, P>(
        &mut self,
        fetcher: &RetryingFetcher<C>,
        builder: &FilenameBuilder,
        candidate: &DownloadCandidate<'_>,
        dir: &Path,
        index: usize,
        total: usize,
        progress: &mut P,
    ) -> FetchOutcome
    where
        C: HttpClient,
        P: FnMut(&ProgressEvent),
    {
        let row = candidate.record.id();
        let filename = match guarded(|| builder.build(candidate.record, candidate.url)) {
            Ok(name) => name,
            Err(msg) => {
                tracing::error!(%row, "naming panicked: {}", msg);
                return FetchOutcome::Failure {
                    reason: format!("internal error: {msg}"),
                };
            }
        };
        progress(&ProgressEvent::Downloading {
            index,
            total,
            row,
            filename: filename.clone(),
        });

        let sleeper = &mut self.sleeper;
        let rng = &mut self.rng;
        guarded(|| fetcher.fetch(candidate.url, dir, &filename, sleeper, rng)).unwrap_or_else(
            |msg| {
                tracing::error!(%row, url = candidate.url, "download panicked: {}", msg);
                FetchOutcome::Failure {
                    reason: format!("internal error: {msg}"),
                }
            },
        )
    }
}

fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(&*payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacingConfig;
    use crate::http::HttpResponse;
    use crate::retry::{FetchError, RecordingSleeper};
    use crate::session::CookieRecord;
    use crate::testing::{Reply, ScriptedClient};

    struct FixedSession {
        ua: Option<&'static str>,
        released: bool,
    }

    impl FixedSession {
        fn ok() -> Self {
            Self {
                ua: Some("UA/1.0"),
                released: false,
            }
        }
    }

    impl SessionSource for FixedSession {
        fn cookies(&self) -> Result<Vec<CookieRecord>, SessionError> {
            Ok(vec![CookieRecord::new("sid", "abc", "x", "/")])
        }

        fn user_agent(&self) -> Result<String, SessionError> {
            self.ua
                .map(str::to_string)
                .ok_or_else(|| SessionError::MissingUserAgent(PathBuf::from("browser")))
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    /// Triggers the interrupt once `after` requests have been answered.
    struct TripAfter {
        inner: ScriptedClient,
        flag: InterruptFlag,
        after: usize,
    }

    impl HttpClient for TripAfter {
        fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
            timeout: Duration,
        ) -> Result<HttpResponse, FetchError> {
            let r = self.inner.get(url, headers, timeout);
            if self.inner.seen.borrow().len() >= self.after {
                self.flag.trigger();
            }
            r
        }
    }

    struct PanicOn(&'static str, ScriptedClient);

    impl HttpClient for PanicOn {
        fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
            timeout: Duration,
        ) -> Result<HttpResponse, FetchError> {
            if url.contains(self.0) {
                panic!("boom on {url}");
            }
            self.1.get(url, headers, timeout)
        }
    }

    fn quiet_config() -> RcptConfig {
        RcptConfig {
            validation_url: String::new(),
            pacing: Some(PacingConfig::none()),
            ..RcptConfig::default()
        }
    }

    fn pipeline(cfg: RcptConfig, flag: InterruptFlag) -> Pipeline<RecordingSleeper, StdRng> {
        Pipeline::with_parts(cfg, flag, RecordingSleeper::default(), StdRng::seed_from_u64(1))
    }

    fn setup(csv: &str) -> (tempfile::TempDir, RunPaths) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.csv");
        fs::write(&input, csv).unwrap();
        let paths = RunPaths::new(&input, dir.path().join("receipts"));
        (dir, paths)
    }

    fn output_column(paths: &RunPaths) -> Vec<String> {
        let t = Table::load(&paths.output).unwrap();
        let idx = t.column_index("Downloaded_Receipt_Filename").unwrap();
        t.records().iter().map(|r| r.fields()[idx].clone()).collect()
    }

    #[test]
    fn duplicate_names_are_suffixed_and_linkless_rows_kept() {
        let (_dir, paths) = setup(
            "Merchant,Amount,Receipt Direct Link\n\
             Cafe,12.50,https://x/a.jpg\n\
             Cafe,12.50,\n\
             Cafe,12.50,https://x/b.jpg\n",
        );
        let client = ScriptedClient::new()
            .on("https://x/a.jpg", vec![Reply::ok(b"first")])
            .on("https://x/b.jpg", vec![Reply::ok(b"second")]);
        let mut source = FixedSession::ok();

        let report = pipeline(quiet_config(), InterruptFlag::new())
            .run(&mut source, &client, &paths, |_| {})
            .unwrap();

        assert_eq!(report.state, RunState::Completed);
        assert_eq!((report.rows, report.candidates, report.succeeded), (3, 2, 2));
        assert_eq!(output_column(&paths), ["Cafe_12.50.jpg", "", "Cafe_12.50_1.jpg"]);
        assert_eq!(fs::read(paths.download_dir.join("Cafe_12.50.jpg")).unwrap(), b"first");
        assert_eq!(fs::read(paths.download_dir.join("Cafe_12.50_1.jpg")).unwrap(), b"second");
        assert!(source.released);
    }

    #[test]
    fn persistent_server_error_is_recorded_and_leaves_no_file() {
        let (_dir, paths) = setup("Merchant,Amount,Receipt Direct Link\nCafe,1,https://x/a.jpg\n");
        let client = ScriptedClient::new().on("https://x/a.jpg", vec![Reply::Status(500, Vec::new())]);

        let mut p = pipeline(quiet_config(), InterruptFlag::new());
        let report = p.run(&mut FixedSession::ok(), &client, &paths, |_| {}).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(client.calls_to("https://x/a.jpg"), 3);
        assert_eq!(output_column(&paths), ["FAILED: HTTP 500"]);
        assert_eq!(fs::read_dir(&paths.download_dir).unwrap().count(), 0);
        assert_eq!(p.sleeper().slept.len(), 2);
    }

    #[test]
    fn interrupt_keeps_processed_rows() {
        let mut csv = String::from("Merchant,Amount,Receipt Direct Link\n");
        let mut client = ScriptedClient::new();
        for i in 0..5 {
            let url = format!("https://x/{i}.jpg");
            csv.push_str(&format!("Shop{i},{i},{url}\n"));
            client = client.on(&url, vec![Reply::ok(b"x")]);
        }
        let (_dir, paths) = setup(&csv);
        let flag = InterruptFlag::new();
        let trip = TripAfter {
            inner: client,
            flag: flag.clone(),
            after: 2,
        };

        let report = pipeline(quiet_config(), flag)
            .run(&mut FixedSession::ok(), &trip, &paths, |_| {})
            .unwrap();

        assert_eq!(report.state, RunState::Interrupted);
        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped(), 3);
        assert_eq!(output_column(&paths), ["Shop0_0.jpg", "Shop1_1.jpg", "", "", ""]);
        assert_eq!(trip.inner.seen.borrow().len(), 2);
    }

    #[test]
    fn interrupt_during_a_failing_fetch_skips_its_retries() {
        let (_dir, paths) = setup(
            "Merchant,Amount,Receipt Direct Link
             Cafe,1,https://x/bad.jpg
             Shop,2,https://x/ok.jpg
",
        );
        let flag = InterruptFlag::new();
        let trip = TripAfter {
            inner: ScriptedClient::new()
                .on("https://x/bad.jpg", vec![Reply::Status(500, Vec::new())])
                .on("https://x/ok.jpg", vec![Reply::ok(b"x")]),
            flag: flag.clone(),
            after: 1,
        };

        let mut p = pipeline(quiet_config(), flag);
        let report = p.run(&mut FixedSession::ok(), &trip, &paths, |_| {}).unwrap();

        assert_eq!(report.state, RunState::Interrupted);
        assert_eq!(report.processed, 1);
        assert_eq!(output_column(&paths), ["FAILED: HTTP 500", ""]);
        assert_eq!(trip.inner.calls_to("https://x/bad.jpg"), 1);
        assert!(p.sleeper().slept.is_empty());
    }

    #[test]
    fn missing_link_column_is_fatal() {
        let (_dir, paths) = setup("Merchant,Amount\nCafe,1\n");
        let mut source = FixedSession::ok();
        let err = pipeline(quiet_config(), InterruptFlag::new())
            .run(&mut source, ScriptedClient::new(), &paths, |_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TableLoad {
                source: TableError::MissingColumn(_),
                ..
            }
        ));
        assert!(!paths.output.exists());
        assert!(source.released);
    }

    #[test]
    fn unreachable_session_is_fatal_before_any_request() {
        let (_dir, paths) = setup("Merchant,Amount,Receipt Direct Link\nCafe,1,https://x/a.jpg\n");
        let client = ScriptedClient::new();
        let mut source = FixedSession {
            ua: None,
            released: false,
        };
        let err = pipeline(quiet_config(), InterruptFlag::new())
            .run(&mut source, &client, &paths, |_| {})
            .unwrap_err();
        assert!(matches!(err, PipelineError::Setup(_)));
        assert!(client.seen.borrow().is_empty());
        assert!(!paths.download_dir.exists());
        assert!(source.released);
    }

    #[test]
    fn panic_in_one_row_does_not_stop_the_run() {
        let (_dir, paths) = setup(
            "Merchant,Amount,Receipt Direct Link\n\
             A,1,https://x/boom.jpg\n\
             B,2,https://x/fine.jpg\n",
        );
        let client = PanicOn(
            "boom",
            ScriptedClient::new().on("https://x/fine.jpg", vec![Reply::ok(b"ok")]),
        );
        let report = pipeline(quiet_config(), InterruptFlag::new())
            .run(&mut FixedSession::ok(), &client, &paths, |_| {})
            .unwrap();
        assert_eq!((report.succeeded, report.failed), (1, 1));
        let col = output_column(&paths);
        assert!(col[0].starts_with("FAILED: internal error"), "{}", col[0]);
        assert_eq!(col[1], "B_2.jpg");
    }

    #[test]
    fn pauses_between_items_but_not_after_the_last() {
        let (_dir, paths) = setup(
            "Merchant,Amount,Receipt Direct Link\n\
             A,1,https://x/1.jpg\n\
             B,2,https://x/2.jpg\n\
             C,3,https://x/3.jpg\n",
        );
        let client = ScriptedClient::new()
            .on("https://x/1.jpg", vec![Reply::ok(b"1")])
            .on("https://x/2.jpg", vec![Reply::ok(b"2")])
            .on("https://x/3.jpg", vec![Reply::ok(b"3")]);
        let cfg = RcptConfig {
            pacing: Some(PacingConfig {
                short_min_secs: 1.0,
                short_max_secs: 1.0,
                long_min_secs: 4.0,
                long_max_secs: 4.0,
                long_break_every: 2,
                release_grace_secs: 0.5,
            }),
            ..quiet_config()
        };
        let mut events = Vec::new();
        let mut p = pipeline(cfg, InterruptFlag::new());
        p.run(&mut FixedSession::ok(), &client, &paths, |e| events.push(e.clone()))
            .unwrap();

        // short (1s) after #1, long (4s) after #2, nothing after #3, then grace.
        let total: Duration = p.sleeper().slept.iter().sum();
        assert_eq!(total, Duration::from_millis(5_500));
        let breaks: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::LongBreak { after, .. } => Some(*after),
                _ => None,
            })
            .collect();
        assert_eq!(breaks, [2]);
        let downloading = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Downloading { .. }))
            .count();
        assert_eq!(downloading, 3);
    }
}
