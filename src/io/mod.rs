//! File output for mapping runs.

pub mod export;

pub use export::{CsvObserver, write_summary_json};
