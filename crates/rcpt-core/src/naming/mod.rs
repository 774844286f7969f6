//! Receipt filename derivation.
//!
//! Turns a row's descriptive fields (timestamp, merchant, amount) and its
//! receipt URL into a deterministic, filesystem-safe filename. The URL's own
//! filename is the floor, so the result is never empty.

mod path;
mod sanitize;

pub use path::{filename_from_url_path, split_extension};
pub use sanitize::{
    normalize_amount, normalize_merchant, normalize_timestamp, sanitize_filename,
    MERCHANT_MAX_CHARS,
};

use crate::config::RcptConfig;
use crate::table::{SourceRecord, Table};

/// Extension used when the URL's filename has none.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Stem used when the URL has no usable filename at all.
const FALLBACK_STEM: &str = "receipt";

/// Raw descriptive fields of one row, as they appear in the export.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingFields<'a> {
    pub timestamp: Option<&'a str>,
    pub merchant: Option<&'a str>,
    pub amount: Option<&'a str>,
}

/// Derives the filename for a receipt.
///
/// Preference order: `{timestamp}_{merchant}_{amount}{ext}`, then
/// `{merchant}_{amount}{ext}`, then `{merchant}_{original}`, then `{original}`.
/// A field counts as present only if it is non-empty after normalization.
///
/// # Examples
///
/// - merchant `Cafe`, amount `12.50`, URL `https://x/a.jpg` → `Cafe_12.50.jpg`
/// - no fields, URL `https://x/scan.pdf` → `scan.pdf`
pub fn build_filename(fields: &NamingFields<'_>, url: &str) -> String {
    let original = filename_from_url_path(url);
    let ext = original
        .as_deref()
        .map(|name| split_extension(name).1)
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string();
    let original = original.unwrap_or_else(|| format!("{FALLBACK_STEM}{ext}"));

    let present = |raw: Option<&str>, normalize: fn(&str) -> String| {
        raw.map(|v| normalize(v.trim())).filter(|v| !v.is_empty())
    };
    let timestamp = present(fields.timestamp, normalize_timestamp);
    let merchant = present(fields.merchant, normalize_merchant);
    let amount = present(fields.amount, normalize_amount);

    let composed = match (timestamp, merchant, amount) {
        (Some(t), Some(m), Some(a)) => format!("{t}_{m}_{a}{ext}"),
        (_, Some(m), Some(a)) => format!("{m}_{a}{ext}"),
        (_, Some(m), None) => format!("{m}_{original}"),
        _ => original,
    };

    let sanitized = sanitize_filename(&composed);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        format!("{FALLBACK_STEM}{ext}")
    } else {
        sanitized
    }
}

/// [`build_filename`] bound to a table's naming columns.
#[derive(Debug, Clone, Copy)]
pub struct FilenameBuilder {
    timestamp: Option<usize>,
    merchant: Option<usize>,
    amount: Option<usize>,
}

impl FilenameBuilder {
    /// Resolves the configured naming columns; absent columns are simply unused.
    pub fn for_table(table: &Table, cfg: &RcptConfig) -> Self {
        Self {
            timestamp: table.column_index(&cfg.timestamp_column),
            merchant: table.column_index(&cfg.merchant_column),
            amount: table.column_index(&cfg.amount_column),
        }
    }

    pub fn build(&self, record: &SourceRecord, url: &str) -> String {
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i));
        let fields = NamingFields {
            timestamp: field(self.timestamp),
            merchant: field(self.merchant),
            amount: field(self.amount),
        };
        build_filename(&fields, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(
        timestamp: Option<&'a str>,
        merchant: Option<&'a str>,
        amount: Option<&'a str>,
    ) -> NamingFields<'a> {
        NamingFields {
            timestamp,
            merchant,
            amount,
        }
    }

    #[test]
    fn all_three_fields() {
        let f = fields(Some("2024-03-01 09:15:00"), Some("Blue Bottle"), Some("1,204.10"));
        assert_eq!(
            build_filename(&f, "https://x/r/abc.png"),
            "2024-03-01_09-15-00_Blue_Bottle_1204.10.png"
        );
    }

    #[test]
    fn merchant_and_amount() {
        let f = fields(None, Some("Cafe"), Some("12.50"));
        assert_eq!(build_filename(&f, "https://x/a.jpg"), "Cafe_12.50.jpg");
    }

    #[test]
    fn merchant_only_keeps_original_name() {
        let f = fields(Some("2024-01-01"), Some("Cafe"), Some(""));
        assert_eq!(build_filename(&f, "https://x/scan.pdf"), "Cafe_scan.pdf");
    }

    #[test]
    fn no_fields_uses_original() {
        let f = fields(None, None, Some("9.99"));
        assert_eq!(build_filename(&f, "https://x/y/scan.pdf?sig=1"), "scan.pdf");
    }

    #[test]
    fn missing_extension_defaults_to_jpg() {
        let f = fields(None, Some("Cafe"), Some("3"));
        assert_eq!(build_filename(&f, "https://x/getReceipt"), "Cafe_3.jpg");
    }

    #[test]
    fn merchant_stripped_to_nothing_is_absent() {
        let f = fields(None, Some("***"), Some("3"));
        assert_eq!(build_filename(&f, "https://x/r.gif"), "r.gif");
    }

    #[test]
    fn url_without_path_has_a_floor() {
        assert_eq!(build_filename(&NamingFields::default(), "https://x/"), "receipt.jpg");
        assert_eq!(build_filename(&NamingFields::default(), ""), "receipt.jpg");
    }

    #[test]
    fn reserved_characters_never_survive() {
        let f = fields(Some("01/02/2024 10:00"), Some("A|B"), Some("5"));
        let name = build_filename(&f, "https://x/a%3F.jpg");
        for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
            assert!(!name.contains(c), "{name} contains {c}");
        }
        assert_eq!(name, "01_02_2024_10-00_AB_5.jpg");
    }

    #[test]
    fn deterministic() {
        let f = fields(Some("2024-01-01 00:00"), Some("Shop"), Some("1"));
        let a = build_filename(&f, "https://x/q.jpg");
        let b = build_filename(&f, "https://x/q.jpg");
        assert_eq!(a, b);
    }

    #[test]
    fn builder_reads_configured_columns() {
        let table = Table::new(
            vec!["Merchant".into(), "Amount".into(), "Receipt Direct Link".into()],
            vec![vec!["Cafe".into(), "12.50".into(), "https://x/a.jpg".into()]],
        )
        .unwrap();
        let builder = FilenameBuilder::for_table(&table, &RcptConfig::default());
        let record = &table.records()[0];
        assert_eq!(builder.build(record, "https://x/a.jpg"), "Cafe_12.50.jpg");
    }
}
