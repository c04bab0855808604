//! Input/output helpers.
//!
//! - CSV ingest + coercion (`ingest`)
//! - prediction exports (CSV) (`export`)
//! - saved dashboard JSON read/write (`dashboard_file`)

pub mod dashboard_file;
pub mod export;
pub mod ingest;

pub use dashboard_file::*;
pub use export::*;
pub use ingest::*;
