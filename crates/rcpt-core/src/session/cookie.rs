//! Cookie scoping: which bridged cookies go with which request.

use serde::{Deserialize, Serialize};

/// One browser cookie as it crosses the automation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    /// Domain the cookie is scoped to; a leading dot is ignored. Empty matches any host.
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

impl CookieRecord {
    pub fn new(name: &str, value: &str, domain: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: path.to_string(),
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.trim().trim_start_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return true;
        }
        host == domain
            || (host.len() > domain.len()
                && host.ends_with(&domain)
                && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
    }

    fn matches_path(&self, path: &str) -> bool {
        let cookie_path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        if path == cookie_path {
            return true;
        }
        path.starts_with(cookie_path)
            && (cookie_path.ends_with('/') || path.as_bytes().get(cookie_path.len()) == Some(&b'/'))
    }
}

/// All cookies of a bridged session.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<CookieRecord>,
}

impl CookieJar {
    pub fn new(cookies: Vec<CookieRecord>) -> Self {
        Self { cookies }
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `Cookie` header value for `url`, or `None` if no cookie applies.
    ///
    /// Longer (more specific) paths come first.
    pub fn header_for(&self, url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        let path = parsed.path();

        let mut matching: Vec<&CookieRecord> = self
            .cookies
            .iter()
            .filter(|c| c.matches_host(&host) && c.matches_path(path))
            .collect();
        if matching.is_empty() {
            return None;
        }
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Some(
            matching
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
