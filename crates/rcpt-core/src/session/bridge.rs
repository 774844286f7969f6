use std::time::Duration;

use super::{CookieJar, SessionError, SessionSource};
use crate::http::{CurlClient, HttpClient, HttpResponse};
use crate::retry::FetchError;

/// Headers a desktop browser sends on a top-level navigation.
pub const BASELINE_HEADERS: [(&str, &str); 5] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// HTTP client carrying a bridged session's cookies and user-agent.
#[derive(Debug, Clone)]
pub struct BridgedClient<C = CurlClient> {
    inner: C,
    jar: CookieJar,
    user_agent: String,
}

impl<C: HttpClient> BridgedClient<C> {
    /// Copies cookies and user-agent out of `source`. No network traffic.
    pub fn from_source<S: SessionSource + ?Sized>(source: &S, inner: C) -> Result<Self, SessionError> {
        let jar = CookieJar::new(source.cookies()?);
        let user_agent = source.user_agent()?;
        Ok(Self {
            inner,
            jar,
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn cookie_count(&self) -> usize {
        self.jar.len()
    }

    /// Best-effort check that the session is accepted. Logs the result and
    /// returns whether the server answered 200.
    pub fn validate(&self, url: &str, timeout: Duration) -> bool {
        match self.get(url, &[], timeout) {
            Ok(resp) if resp.status == 200 => {
                tracing::info!(url, "session validated");
                true
            }
            Ok(resp) => {
                tracing::warn!(url, status = resp.status, "session may not be authenticated; continuing");
                false
            }
            Err(e) => {
                tracing::warn!(url, "could not validate session ({}); continuing", e);
                false
            }
        }
    }

    /// User-Agent, baseline headers and matching cookies, then `extra`
    /// (which replaces any baseline header of the same name).
    fn request_headers(&self, url: &str, extra: &[(String, String)]) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> =
            Vec::with_capacity(BASELINE_HEADERS.len() + 2 + extra.len());
        headers.push(("User-Agent".to_string(), self.user_agent.clone()));
        for (name, value) in BASELINE_HEADERS {
            headers.push((name.to_string(), value.to_string()));
        }
        if let Some(cookie) = self.jar.header_for(url) {
            headers.push(("Cookie".to_string(), cookie));
        }
        for (name, value) in extra {
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }
        headers
    }
}

impl<C: HttpClient> HttpClient for BridgedClient<C> {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.inner.get(url, &self.request_headers(url, headers), timeout)
    }
}

/// Bridges `source` onto `inner` and runs the one-off validation request.
///
/// Only a source that cannot produce its cookies/user-agent is an error; a
/// failed validation is logged and the client is still returned, since the
/// first real download is the actual proof of authentication. An empty
/// `validation_url` skips the check.
pub fn bridge<S, C>(
    source: &S,
    inner: C,
    validation_url: &str,
    timeout: Duration,
) -> Result<BridgedClient<C>, SessionError>
where
    S: SessionSource + ?Sized,
    C: HttpClient,
{
    let client = BridgedClient::from_source(source, inner)?;
    tracing::info!(cookies = client.cookie_count(), "session bridged");
    if client.jar.is_empty() {
        tracing::warn!("bridged session carries no cookies");
    }
    if !validation_url.trim().is_empty() {
        client.validate(validation_url.trim(), timeout);
    }
    Ok(client)
}
