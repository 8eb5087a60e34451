//! Error types for NetCDF reading.

use current_grid::GridError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF reading.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the netcdf library
    #[error("NetCDF error in {path}: {message}")]
    Library { path: String, message: String },

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// No forecast file matched the requested dates
    #[error("No forecast files for {dates} under {dir}")]
    NoForecastFiles { dir: String, dates: String },

    /// The components read do not form a valid field
    #[error(transparent)]
    Field(#[from] GridError),
}

impl NetCdfError {
    pub fn library(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Library {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Convert into the error the pipeline expects from a dataset source.
    ///
    /// Field validation errors keep their kind; everything else means the
    /// dataset could not be supplied.
    pub fn into_grid_error(self, dataset_id: &str) -> GridError {
        match self {
            NetCdfError::Field(e) => e,
            other => GridError::upstream(dataset_id, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_grid_error() {
        let err = NetCdfError::MissingData("uo variable".into()).into_grid_error("nws");
        assert_eq!(
            err,
            GridError::upstream("nws", "Missing required data: uo variable")
        );

        let err = NetCdfError::Field(GridError::malformed("bad")).into_grid_error("nws");
        assert!(matches!(err, GridError::MalformedField(_)));
    }
}
