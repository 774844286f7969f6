//! Filename and extension extraction from a receipt URL.

/// Extracts the last path segment of a URL, the receipt's "original" filename.
///
/// Query string and fragment never contribute. If the URL does not parse, the
/// raw string is split on `/` instead. Returns `None` when there is no usable
/// segment (root path, `.`/`..`).
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .map(str::to_string)?,
        Err(_) => {
            let raw = url.split(['?', '#']).next().unwrap_or("");
            raw.split('/').filter(|s| !s.is_empty()).last()?.to_string()
        }
    };
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}

/// Splits `name` into stem and extension (extension keeps its dot).
///
/// The extension starts at the last dot, ignoring leading dots, so
/// `.hidden` has none and `archive.tar.gz` yields `.gz`.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(i) => name.split_at(leading + i),
        None => (name, ""),
    }
}
