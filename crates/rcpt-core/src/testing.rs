//! Scripted HTTP client for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::http::{HttpClient, HttpResponse};
use crate::retry::FetchError;

/// One scripted reply.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u32, Vec<u8>),
    /// Curl "couldn't connect".
    Transport,
}

impl Reply {
    pub(crate) fn ok(body: &[u8]) -> Self {
        Reply::Status(200, body.to_vec())
    }
}

/// A request the client saw.
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) timeout: Duration,
}

/// Replies per URL from a queue; when a URL's queue runs dry its last reply repeats.
#[derive(Debug, Default)]
pub(crate) struct ScriptedClient {
    scripts: RefCell<Vec<(String, VecDeque<Reply>, Option<Reply>)>>,
    pub(crate) seen: RefCell<Vec<SeenRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, url: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .borrow_mut()
            .push((url.to_string(), replies.into(), None));
        self
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.seen.borrow().iter().filter(|r| r.url == url).count()
    }
}

impl HttpClient for ScriptedClient {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.seen.borrow_mut().push(SeenRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
            timeout,
        });
        let mut scripts = self.scripts.borrow_mut();
        let reply = scripts
            .iter_mut()
            .find(|(u, _, _)| u == url)
            .and_then(|(_, queue, last)| {
                if let Some(r) = queue.pop_front() {
                    *last = Some(r.clone());
                }
                last.clone()
            })
            .unwrap_or(Reply::Status(404, Vec::new()));
        match reply {
            Reply::Status(status, body) => Ok(HttpResponse { status, body }),
            Reply::Transport => Err(FetchError::Curl(curl::Error::new(7))),
        }
    }
}
