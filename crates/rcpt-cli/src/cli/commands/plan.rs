//! `rcpt plan` – dry run over an export.

use anyhow::Result;
use rcpt_core::config::RcptConfig;
use rcpt_core::pipeline;
use std::path::Path;

pub fn run_plan(cfg: &RcptConfig, csv: &Path) -> Result<()> {
    let plan = pipeline::plan(cfg, csv)?;
    if plan.receipts.is_empty() {
        println!("No receipt links in {} ({} row(s)).", csv.display(), plan.rows);
        return Ok(());
    }
    println!("{:<6} {:<40} {}", "ROW", "FILENAME", "URL");
    for r in &plan.receipts {
        // 1-based data row, as a spreadsheet would show it below the header.
        println!("{:<6} {:<40} {}", r.row.index() + 1, r.filename, r.url);
    }
    println!(
        "{} receipt link(s) in {} row(s).",
        plan.receipts.len(),
        plan.rows
    );
    Ok(())
}
