//! Run ledger: row identity → final outcome, merged back into the export.

use std::collections::BTreeMap;

use crate::fetch::FetchOutcome;
use crate::table::{RowId, Table};

/// Prefix of the value recorded for a failed row.
pub const FAILED_PREFIX: &str = "FAILED: ";

/// What a processed row ends up with in the output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    /// Basename of the file actually written.
    Saved(String),
    /// Failure reason.
    Failed(String),
}

impl LedgerEntry {
    pub fn from_outcome(outcome: &FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Success { path } => LedgerEntry::Saved(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            ),
            FetchOutcome::Failure { reason } => LedgerEntry::Failed(reason.clone()),
        }
    }

    /// Cell value for the augmented table.
    pub fn cell(&self) -> String {
        match self {
            LedgerEntry::Saved(name) => name.clone(),
            LedgerEntry::Failed(reason) => format!("{FAILED_PREFIX}{reason}"),
        }
    }
}

/// Outcomes recorded during one run, keyed by row identity.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: BTreeMap<RowId, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome for `row`. A second record for the same row replaces the first.
    pub fn record(&mut self, row: RowId, outcome: &FetchOutcome) {
        let entry = LedgerEntry::from_outcome(outcome);
        if self.entries.insert(row, entry).is_some() {
            tracing::warn!("{} recorded twice; keeping the latest outcome", row);
        }
    }

    pub fn get(&self, row: RowId) -> Option<&LedgerEntry> {
        self.entries.get(&row)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, LedgerEntry::Saved(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Copy of `original` with `column` filled from the ledger, empty for rows
    /// without an entry. Row count and order are those of `original`.
    pub fn materialize(&self, original: &Table, column: &str) -> Table {
        original.with_column(column, |row| {
            self.get(row).map(LedgerEntry::cell).unwrap_or_default()
        })
    }
}
