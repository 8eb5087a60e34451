//! Stride-based resampling of current fields.
//!
//! Spatial resampling keeps every Nth latitude and longitude sample starting
//! at index 0, so the south-west origin never moves. Temporal resampling keeps
//! every Mth time sample where M is the requested cadence divided by the
//! source sampling interval. No interpolation or averaging is done.
//!
//! The source interval is part of the request: a field with one time step
//! carries no interval of its own, but the cadence check still applies.

use serde::{Deserialize, Serialize};
use tide_common::TimeStep;
use tracing::debug;

use crate::error::{GridError, Result};
use crate::field::GriddedVectorField;

/// Requested output density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResamplingSpec {
    /// Keep every Nth latitude and longitude sample
    pub spatial_stride: usize,
    /// Output time cadence
    pub temporal_stride: TimeStep,
    /// Native cadence of the source product
    pub source_interval: TimeStep,
}

impl ResamplingSpec {
    pub fn new(spatial_stride: usize, temporal_stride: TimeStep, source_interval: TimeStep) -> Self {
        Self {
            spatial_stride,
            temporal_stride,
            source_interval,
        }
    }

    /// Keep the source grid and cadence unchanged.
    pub fn identity(source_interval: TimeStep) -> Self {
        Self::new(1, source_interval, source_interval)
    }
}

/// Resample a field to the requested spatial stride and temporal cadence.
///
/// Fails with `InvalidResolution` when the spatial stride is zero or larger
/// than a grid axis, or when the temporal stride is not a whole multiple of
/// the sampling interval. The interval derived from the field's timestamps
/// wins over `spec.source_interval`, which covers single-step fields.
pub fn resample(field: &GriddedVectorField, spec: &ResamplingSpec) -> Result<GriddedVectorField> {
    let (nt, ny, nx) = field.shape();
    let stride = spec.spatial_stride;

    if stride == 0 {
        return Err(GridError::invalid_resolution(
            "spatial resolution factor must be at least 1",
        ));
    }
    for (axis, extent) in [("latitude", ny), ("longitude", nx)] {
        if stride > extent {
            return Err(GridError::invalid_resolution(format!(
                "spatial resolution factor {} exceeds the {} axis of {} samples",
                stride, axis, extent
            )));
        }
    }

    let interval = field.sampling_interval().unwrap_or(spec.source_interval);
    let time_step = spec.temporal_stride.multiple_of(interval).ok_or_else(|| {
        GridError::invalid_resolution(format!(
            "temporal resolution {} is not a multiple of the source interval {}",
            spec.temporal_stride, interval
        ))
    })? as usize;

    let resampled = field.select(0..nt, time_step, 0..ny, stride, 0..nx, stride);

    debug!(
        spatial_stride = stride,
        time_step,
        from = ?(nt, ny, nx),
        to = ?resampled.shape(),
        "Resampled field"
    );

    Ok(resampled)
}
