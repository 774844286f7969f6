//! libcurl-backed `HttpClient`: one `Easy` handle per request.

use std::time::Duration;

use super::{HttpClient, HttpResponse};
use crate::retry::FetchError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: u32 = 10;

/// Blocking GET via curl. Follows redirects (receipt links usually bounce to
/// object storage) and buffers the whole body in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlClient;

impl CurlClient {
    pub fn new() -> Self {
        Self
    }
}

impl HttpClient for CurlClient {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTS)?;
        easy.connect_timeout(CONNECT_TIMEOUT.min(timeout))?;
        easy.timeout(timeout)?;

        // Accept-Encoding goes through curl so the body is decoded for us.
        let mut list = curl::easy::List::new();
        for (name, value) in headers {
            if name.trim().eq_ignore_ascii_case("accept-encoding") {
                easy.accept_encoding(value.trim())?;
                continue;
            }
            list.append(&format!("{}: {}", name.trim(), value.trim()))?;
        }
        easy.http_headers(list)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        tracing::debug!(url, status, bytes = body.len(), "GET finished");
        Ok(HttpResponse { status, body })
    }
}
