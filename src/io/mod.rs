//! Input/output: catalog ingest and result export.

pub mod catalog;
pub mod export;

pub use catalog::*;
pub use export::*;
