//! Exclusive reservation of a final receipt path plus atomic commit.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::TEMP_SUFFIX;

/// A final path claimed with `create_new`. Dropping it without
/// [`commit`](Self::commit) removes the placeholder.
#[derive(Debug)]
pub struct ReservedFile {
    final_path: PathBuf,
    committed: bool,
}

impl ReservedFile {
    /// Claims `final_path`. Returns `Ok(None)` if something already exists there.
    pub fn reserve(final_path: &Path) -> io::Result<Option<Self>> {
        match File::options()
            .write(true)
            .create_new(true)
            .open(final_path)
        {
            Ok(_) => Ok(Some(Self {
                final_path: final_path.to_path_buf(),
                committed: false,
            })),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes `body` to a fresh temp file next to the reservation, syncs it
    /// and renames it over the reservation.
    ///
    /// The temp file is created exclusively under a random name, so it never
    /// truncates or replaces another receipt.
    pub fn commit(mut self, body: &[u8]) -> io::Result<()> {
        let dir = self
            .final_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::Builder::new()
            .prefix(".rcpt-")
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        temp.write_all(body)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.final_path).map_err(|e| e.error)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for ReservedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.final_path) {
            tracing::warn!("could not release {}: {}", self.final_path.display(), e);
        }
    }
}
