//! Session source backed by a HAR capture of the logged-in browser.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use super::parse::{get_header, HarEntry, HarLog};
use crate::session::{CookieRecord, SessionError, SessionSnapshot, SessionSource};

/// Cookies and user-agent lifted from the requests recorded in a HAR file.
///
/// With a host filter, only requests to that host (or its subdomains) are
/// considered. Request cookies without a domain are scoped to the request host.
/// When the same cookie appears several times, the latest request wins.
#[derive(Debug)]
pub struct HarSession {
    path: PathBuf,
    host_filter: Option<String>,
    loaded: OnceCell<SessionSnapshot>,
}

impl HarSession {
    pub fn new(path: impl Into<PathBuf>, host_filter: Option<String>) -> Self {
        Self {
            path: path.into(),
            host_filter: host_filter.map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase()),
            loaded: OnceCell::new(),
        }
    }

    fn snapshot(&self) -> Result<&SessionSnapshot, SessionError> {
        if let Some(s) = self.loaded.get() {
            return Ok(s);
        }
        let s = read_har_session(&self.path, self.host_filter.as_deref())?;
        Ok(self.loaded.get_or_init(|| s))
    }
}

impl SessionSource for HarSession {
    fn cookies(&self) -> Result<Vec<CookieRecord>, SessionError> {
        Ok(self.snapshot()?.cookies.clone())
    }

    fn user_agent(&self) -> Result<String, SessionError> {
        Ok(self.snapshot()?.user_agent.clone())
    }
}

fn read_har_session(path: &Path, host_filter: Option<&str>) -> Result<SessionSnapshot, SessionError> {
    let bytes = std::fs::read(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let har: HarLog = serde_json::from_slice(&bytes).map_err(|e| SessionError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut user_agent = String::new();
    let mut cookies: Vec<CookieRecord> = Vec::new();
    for entry in &har.log.entries {
        let Some(host) = request_host(entry) else {
            continue;
        };
        if let Some(filter) = host_filter {
            if host != filter && !host.ends_with(&format!(".{filter}")) {
                continue;
            }
        }
        if let Some(ua) = get_header(&entry.request.headers, "User-Agent") {
            if !ua.trim().is_empty() {
                user_agent = ua.trim().to_string();
            }
        }
        for cookie in entry_cookies(entry, &host) {
            cookies.retain(|c| {
                !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path)
            });
            cookies.push(cookie);
        }
    }

    if user_agent.is_empty() {
        if cookies.is_empty() {
            return Err(SessionError::Empty(path.to_path_buf()));
        }
        return Err(SessionError::MissingUserAgent(path.to_path_buf()));
    }
    tracing::debug!(cookies = cookies.len(), "read session from HAR {}", path.display());
    Ok(SessionSnapshot {
        user_agent,
        cookies,
    })
}

fn request_host(entry: &HarEntry) -> Option<String> {
    let url = url::Url::parse(&entry.request.url).ok()?;
    url.host_str().map(str::to_ascii_lowercase)
}

/// Structured request cookies, or the raw `Cookie` header if the HAR has none.
fn entry_cookies(entry: &HarEntry, host: &str) -> Vec<CookieRecord> {
    let request = &entry.request;
    if !request.cookies.is_empty() {
        return request
            .cookies
            .iter()
            .map(|c| CookieRecord {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: c.domain.clone().filter(|d| !d.is_empty()).unwrap_or_else(|| host.to_string()),
                path: c.path.clone().filter(|p| !p.is_empty()).unwrap_or_else(|| "/".to_string()),
            })
            .collect();
    }
    get_header(&request.headers, "Cookie")
        .map(|raw| {
            raw.split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .filter(|(name, _)| !name.trim().is_empty())
                .map(|(name, value)| CookieRecord::new(name.trim(), value.trim(), host, "/"))
                .collect()
        })
        .unwrap_or_default()
}
