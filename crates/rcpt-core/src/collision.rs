//! Collision resolution for receipt filenames within a download directory.

use std::path::{Path, PathBuf};

use crate::naming::split_extension;

/// Returns a path in `dir` for `filename` that does not exist yet.
///
/// If `dir/filename` is taken, `_1`, `_2`, ... is inserted before the
/// extension until a free name is found. Existence is checked on disk for
/// every candidate; nothing is remembered between calls, so two rows that
/// derive the same name land on distinct files as long as each is written
/// before the next is resolved.
pub fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let first = dir.join(filename);
    if !exists(&first) {
        return first;
    }
    let (stem, ext) = split_extension(filename);
    let mut counter = 1u64;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}{ext}"));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

// Broken symlinks count as taken.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
