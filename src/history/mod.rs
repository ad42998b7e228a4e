//! Run history: one JSONL line per optimization run and the aggregate
//! report behind `loadplan history`.

pub mod logger;
pub mod reporter;

pub use logger::{RunLog, RunLogEntry, RunOutcome};
