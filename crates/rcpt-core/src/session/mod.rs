//! Session bridging: authenticated browser state → stateless HTTP client.
//!
//! The browser side is a black box that only has to hand over cookies and a
//! user-agent through [`SessionSource`]. [`bridge`] turns that into a
//! [`BridgedClient`] that sends both, plus browser-like baseline headers, on
//! every request.

mod bridge;
mod cookie;
mod file;

pub use bridge::{bridge, BridgedClient, BASELINE_HEADERS};
pub use cookie::{CookieJar, CookieRecord};
pub use file::{SessionFile, SessionSnapshot};

use std::io;
use std::path::PathBuf;

/// Narrow capability exposed by whatever holds the logged-in session.
pub trait SessionSource {
    fn cookies(&self) -> Result<Vec<CookieRecord>, SessionError>;

    fn user_agent(&self) -> Result<String, SessionError>;

    /// Release the underlying session (browser, profile copy, ...). Called
    /// once at the end of a run, after the grace delay.
    fn release(&mut self) {}
}

/// The session could not be reached; fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot read session from {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("cannot parse session {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("session {} has no user agent", .0.display())]
    MissingUserAgent(PathBuf),
    #[error("session {} has no cookies and no user agent", .0.display())]
    Empty(PathBuf),
}
