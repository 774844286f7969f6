//! Session exported to a JSON file by the browser side.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{CookieRecord, SessionError, SessionSource};

/// On-disk shape: `{ "user_agent": "...", "cookies": [ {name, value, domain, path}, ... ] }`.
/// Extra cookie fields (`secure`, `expiry`, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub cookies: Vec<CookieRecord>,
}

/// Lazily read JSON session export. Read errors surface on first use.
#[derive(Debug)]
pub struct SessionFile {
    path: PathBuf,
    loaded: OnceCell<SessionSnapshot>,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: OnceCell::new(),
        }
    }

    fn snapshot(&self) -> Result<&SessionSnapshot, SessionError> {
        if let Some(s) = self.loaded.get() {
            return Ok(s);
        }
        let s = read_snapshot(&self.path)?;
        Ok(self.loaded.get_or_init(|| s))
    }
}

fn read_snapshot(path: &Path) -> Result<SessionSnapshot, SessionError> {
    let bytes = std::fs::read(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: SessionSnapshot =
        serde_json::from_slice(&bytes).map_err(|e| SessionError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if snapshot.user_agent.trim().is_empty() {
        return Err(SessionError::MissingUserAgent(path.to_path_buf()));
    }
    Ok(snapshot)
}

impl SessionSource for SessionFile {
    fn cookies(&self) -> Result<Vec<CookieRecord>, SessionError> {
        Ok(self.snapshot()?.cookies.clone())
    }

    fn user_agent(&self) -> Result<String, SessionError> {
        Ok(self.snapshot()?.user_agent.clone())
    }
}
