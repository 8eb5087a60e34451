//! Errors raised while encoding or writing GRIB2 messages.

use current_grid::GridError;
use thiserror::Error;

pub type Grib2Result<T> = Result<T, Grib2Error>;

#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The record cannot be represented in a GRIB2 message.
    #[error("Cannot encode {field}: {reason}")]
    Unencodable { field: String, reason: String },

    #[error("Invalid GRIB2 data: {0}")]
    InvalidFormat(String),

    /// Write attempted after `finish` or `abort`.
    #[error("Output {0} is already closed")]
    Closed(String),
}

impl Grib2Error {
    pub fn unencodable(field: impl ToString, reason: impl Into<String>) -> Self {
        Self::Unencodable {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<Grib2Error> for GridError {
    fn from(err: Grib2Error) -> Self {
        GridError::output_failed(err.to_string())
    }
}
