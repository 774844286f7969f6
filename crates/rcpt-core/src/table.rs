//! The expense export: CSV rows with an explicit, stable row identity.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the input stem for the augmented export.
pub const AUGMENTED_SUFFIX: &str = "_with_filenames.csv";

/// Position of a row in the export as loaded. Stable for the whole run,
/// independent of any filtering applied afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(usize);

impl RowId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("cannot open {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("table has no '{0}' column")]
    MissingColumn(String),
    #[error("{row} has {found} fields, header has {expected}")]
    RaggedRow {
        row: RowId,
        expected: usize,
        found: usize,
    },
}

/// One row of the export. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    id: RowId,
    fields: Vec<String>,
}

impl SourceRecord {
    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// A row with a non-empty receipt link, eligible for download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadCandidate<'a> {
    pub record: &'a SourceRecord,
    pub url: &'a str,
}

/// Header plus rows, all rows exactly as wide as the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<SourceRecord>,
}

impl Table {
    /// Builds a table, assigning row identities in order.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        let mut records = Vec::with_capacity(rows.len());
        for (i, fields) in rows.into_iter().enumerate() {
            let id = RowId::new(i);
            if fields.len() != headers.len() {
                return Err(TableError::RaggedRow {
                    row: id,
                    expected: headers.len(),
                    found: fields.len(),
                });
            }
            records.push(SourceRecord { id, fields });
        }
        Ok(Self { headers, records })
    }

    /// Reads a CSV export with a header row.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            rows = table.len(),
            columns = table.headers.len(),
            "loaded {}",
            path.display()
        );
        Ok(table)
    }

    /// Short rows are padded with empty cells; rows longer than the header
    /// are rejected.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let mut fields: Vec<String> = record?.iter().map(str::to_string).collect();
            if fields.len() < headers.len() {
                fields.resize(headers.len(), String::new());
            }
            rows.push(fields);
        }
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Rows whose `link_column` holds a non-blank value, in table order.
    ///
    /// Fails if the column does not exist at all.
    pub fn candidates(&self, link_column: &str) -> Result<Vec<DownloadCandidate<'_>>, TableError> {
        let idx = self
            .column_index(link_column)
            .ok_or_else(|| TableError::MissingColumn(link_column.to_string()))?;
        Ok(self
            .records
            .iter()
            .filter_map(|record| {
                let url = record.get(idx)?.trim();
                (!url.is_empty()).then_some(DownloadCandidate { record, url })
            })
            .collect())
    }

    /// Copy of this table with `column` set from `value_for` for every row.
    ///
    /// An existing column of that name is overwritten in place; otherwise the
    /// column is appended. Row count and order are preserved.
    pub fn with_column<F>(&self, column: &str, mut value_for: F) -> Table
    where
        F: FnMut(RowId) -> String,
    {
        let existing = self.column_index(column);
        let mut headers = self.headers.clone();
        if existing.is_none() {
            headers.push(column.to_string());
        }
        let records = self
            .records
            .iter()
            .map(|r| {
                let mut fields = r.fields.clone();
                let value = value_for(r.id);
                match existing {
                    Some(i) => fields[i] = value,
                    None => fields.push(value),
                }
                SourceRecord { id: r.id, fields }
            })
            .collect();
        Table { headers, records }
    }

    /// Writes the table as CSV, header first.
    pub fn write(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.to_writer(file)
    }

    pub fn to_writer<W: io::Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for record in &self.records {
            wtr.write_record(&record.fields)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// `exports/report.csv` → `exports/report_with_filenames.csv`.
pub fn augmented_path(input: &Path) -> PathBuf {
    let stem = input.with_extension("");
    let mut name = stem.into_os_string();
    name.push(AUGMENTED_SUFFIX);
    PathBuf::from(name)
}
