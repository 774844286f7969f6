//! Field normalization and filesystem-safe filename sanitization.

/// Characters invalid in filenames on at least one common filesystem.
const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest merchant fragment kept in a filename, in characters.
pub const MERCHANT_MAX_CHARS: usize = 50;

/// Replaces reserved characters and control characters with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// `2024-01-05 10:30:00` → `2024-01-05_10-30-00`.
pub fn normalize_timestamp(raw: &str) -> String {
    raw.replace(':', "-").replace(' ', "_")
}

/// Thousands separators removed: `1,234.50` → `1234.50`.
pub fn normalize_amount(raw: &str) -> String {
    raw.replace(',', "")
}

/// Merchant names become a single filename-friendly token.
///
/// Path separators turn into `-`, anything other than word characters,
/// whitespace and `-` is dropped, whitespace runs collapse to `_`, and the
/// result is cut to [`MERCHANT_MAX_CHARS`].
pub fn normalize_merchant(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }

    out.chars().take(MERCHANT_MAX_CHARS).collect()
}
