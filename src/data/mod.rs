//! Built-in data: grain opacity tables and synthetic test catalogs.

pub mod opacity;
pub mod synthetic;

pub use opacity::*;
pub use synthetic::*;
