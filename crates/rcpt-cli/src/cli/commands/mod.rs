//! CLI command handlers, one file per command.

mod plan;
mod run;

pub use plan::run_plan;
pub use run::{run_receipts, SessionArgs};
