//! HAR (HTTP Archive) session source.
//!
//! A HAR saved from the browser's network panel while logged in carries
//! exactly what the bridge needs: the cookies sent with each request and the
//! browser's `User-Agent`.

mod parse;
mod session;

pub use session::HarSession;
