//! Error types for the transformation pipeline.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while transforming a current field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// The resampling request does not fit the source grid.
    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    /// The u/v components disagree, or the coordinates are not a regular grid.
    #[error("malformed field: {0}")]
    MalformedField(String),

    /// The dataset source could not supply the field.
    #[error("dataset '{dataset}' unavailable: {reason}")]
    UpstreamUnavailable { dataset: String, reason: String },

    /// The serialization collaborator failed to persist a record.
    #[error("output failed: {0}")]
    OutputFailed(String),
}

impl GridError {
    /// Create an InvalidResolution error.
    pub fn invalid_resolution(msg: impl Into<String>) -> Self {
        Self::InvalidResolution(msg.into())
    }

    /// Create a MalformedField error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedField(msg.into())
    }

    /// Create an UpstreamUnavailable error.
    pub fn upstream(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }

    /// Create an OutputFailed error.
    pub fn output_failed(msg: impl Into<String>) -> Self {
        Self::OutputFailed(msg.into())
    }
}

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Source,
    Resample,
    Convert,
    Emit,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Source => "source",
            Stage::Resample => "resample",
            Stage::Convert => "convert",
            Stage::Emit => "emit",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

/// A [`GridError`] tagged with the stage that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: GridError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: GridError) -> Self {
        Self { stage, error }
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_names_stage() {
        let err = PipelineError::new(
            Stage::Resample,
            GridError::invalid_resolution("20m is not a multiple of 15m"),
        );
        assert_eq!(
            err.to_string(),
            "resample stage failed: invalid resolution: 20m is not a multiple of 15m"
        );
    }

    #[test]
    fn test_upstream_message() {
        let err = GridError::upstream("cmems_mod_nws", "no forecast files found");
        assert_eq!(
            err.to_string(),
            "dataset 'cmems_mod_nws' unavailable: no forecast files found"
        );
    }
}
