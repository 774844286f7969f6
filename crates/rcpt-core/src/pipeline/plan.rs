//! Dry run: what a run would request and how it would name the files.

use std::path::Path;

use super::PipelineError;
use crate::config::RcptConfig;
use crate::naming::FilenameBuilder;
use crate::table::{RowId, Table};

/// Rows in the export and what would be fetched for them.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub rows: usize,
    pub receipts: Vec<PlannedReceipt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReceipt {
    pub row: RowId,
    pub url: String,
    /// Name before collision resolution against the download directory.
    pub filename: String,
}

/// Loads the export and derives a filename for every candidate. Touches
/// neither the network nor the download directory.
pub fn plan(cfg: &RcptConfig, input: &Path) -> Result<RunPlan, PipelineError> {
    let table_err = |source| PipelineError::TableLoad {
        path: input.to_path_buf(),
        source,
    };
    let table = Table::load(input).map_err(table_err)?;
    let builder = FilenameBuilder::for_table(&table, cfg);
    let receipts = table
        .candidates(&cfg.link_column)
        .map_err(table_err)?
        .into_iter()
        .map(|c| PlannedReceipt {
            row: c.record.id(),
            url: c.url.to_string(),
            filename: builder.build(c.record, c.url),
        })
        .collect();
    Ok(RunPlan {
        rows: table.len(),
        receipts,
    })
}
