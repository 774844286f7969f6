//! Receipt persistence.
//!
//! A receipt body is written once: the final name is reserved with exclusive
//! creation, the bytes go to a randomly named `.part` temp file that is
//! fsynced, and the temp file is atomically renamed over the reservation. Any
//! failure removes both, so a failed download leaves nothing behind.

mod writer;

pub use writer::ReservedFile;

use std::io;
use std::path::{Path, PathBuf};

use crate::collision::resolve_unique_path;

/// Suffix of the temp file a body is written to before the rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Reservation attempts before giving up on a contended name.
const MAX_RESERVE_TRIES: usize = 16;

/// Writes `body` under a collision-free variant of `filename` in `dir` and
/// returns the path actually written.
pub fn persist_unique(dir: &Path, filename: &str, body: &[u8]) -> io::Result<PathBuf> {
    for _ in 0..MAX_RESERVE_TRIES {
        let path = resolve_unique_path(dir, filename);
        match ReservedFile::reserve(&path)? {
            Some(reserved) => {
                reserved.commit(body)?;
                return Ok(path);
            }
            None => {
                tracing::debug!("lost reservation race for {}", path.display());
            }
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {filename} in {}", dir.display()),
    ))
}
