//! Plain HTTP GET, the only network operation rcpt performs.
//!
//! `HttpClient` is the seam between the fetcher and the network: the session
//! bridge wraps a `CurlClient` with cookies and browser headers, and tests
//! substitute scripted clients.

mod curl_client;

pub use curl_client::CurlClient;

use crate::retry::FetchError;
use std::time::Duration;

/// Status and full body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can perform a blocking GET and hand back the whole body.
///
/// A transport failure (DNS, connect, timeout) is an `Err`; any HTTP status,
/// including 4xx/5xx, is an `Ok` response for the caller to judge.
pub trait HttpClient {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        (**self).get(url, headers, timeout)
    }
}
