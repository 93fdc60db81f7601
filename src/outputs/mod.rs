//! Output generation for JSON files and console reports.
//!
//! # Submodules
//!
//! - [`json`]: Writes (and re-reads) record arrays as pretty-printed JSON
//! - [`report`]: Builds the human-readable summaries printed after each job

pub mod json;
pub mod report;
