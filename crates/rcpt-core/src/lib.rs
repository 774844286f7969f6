pub mod config;
pub mod logging;

pub mod collision;
pub mod fetch;
pub mod har;
pub mod http;
pub mod interrupt;
pub mod ledger;
pub mod naming;
pub mod pipeline;
pub mod retry;
pub mod session;
pub mod storage;
pub mod table;

#[cfg(test)]
mod testing;
