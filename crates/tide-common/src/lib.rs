//! Common types shared across the tidal-current converter crates.

pub mod bbox;
pub mod grid;
pub mod time;

pub use bbox::{BboxParseError, BoundingBox};
pub use grid::{GridSpec, ScanMode};
pub use time::{TimeParseError, TimeStep, TimeUnit, ValidTime};
