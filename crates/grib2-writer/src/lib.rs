//! GRIB2 output for tidal-current records.
//!
//! [`MessageEncoder`] turns each [`current_grid::OutputRecord`] into one
//! edition 2 message (discipline 10, category 1). [`Grib2FileSink`] streams
//! those messages into a file and is the [`current_grid::RecordSink`] used by
//! the converter.

pub mod encoder;
pub mod error;
pub mod packing;
pub mod sink;

pub use encoder::{decimal_scale, forecast_time, normalise_longitude, MessageEncoder};
pub use error::{Grib2Error, Grib2Result};
pub use packing::{pack_simple, PackedField};
pub use sink::Grib2FileSink;
