//! Gridded eastward/northward current fields.
//!
//! Values are stored flat in `(time, latitude, longitude)` row-major order,
//! latitudes ascending (south to north) and longitudes ascending (west to
//! east). Missing cells (land) are `NaN`.

use chrono::{DateTime, Utc};
use std::ops::Range;
use tide_common::{BoundingBox, GridSpec, TimeStep};
use tracing::debug;

use crate::error::{GridError, Result};

/// Relative tolerance allowed between consecutive coordinate spacings.
///
/// Source coordinates are often stored as f32, so a 0.027° spacing near 50°N
/// carries rounding noise in the fourth significant digit.
const SPACING_TOLERANCE: f64 = 0.01;

/// One named component (e.g. `uo` or `vo`) with its own coordinate vectors,
/// as read from a data source before the pair is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentGrid {
    /// Variable name in the source dataset
    pub name: String,
    pub times: Vec<DateTime<Utc>>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    /// Values in m/s, `(time, latitude, longitude)` row-major
    pub values: Vec<f32>,
}

impl ComponentGrid {
    pub fn new(
        name: impl Into<String>,
        times: Vec<DateTime<Utc>>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        values: Vec<f32>,
    ) -> Self {
        Self {
            name: name.into(),
            times,
            latitudes,
            longitudes,
            values,
        }
    }

    /// `(time, latitude, longitude)` extents implied by the coordinates.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.times.len(), self.latitudes.len(), self.longitudes.len())
    }
}

/// A validated pair of eastward (u) and northward (v) current components
/// sharing one set of coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedVectorField {
    times: Vec<DateTime<Utc>>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    eastward: Vec<f32>,
    northward: Vec<f32>,
    interval: Option<TimeStep>,
}

impl GriddedVectorField {
    /// Pair two components, checking that they describe the same grid.
    pub fn from_components(eastward: ComponentGrid, northward: ComponentGrid) -> Result<Self> {
        if eastward.times != northward.times {
            return Err(GridError::malformed(format!(
                "components '{}' and '{}' have different time coordinates",
                eastward.name, northward.name
            )));
        }
        if eastward.latitudes != northward.latitudes {
            return Err(GridError::malformed(format!(
                "components '{}' and '{}' have different latitude coordinates",
                eastward.name, northward.name
            )));
        }
        if eastward.longitudes != northward.longitudes {
            return Err(GridError::malformed(format!(
                "components '{}' and '{}' have different longitude coordinates",
                eastward.name, northward.name
            )));
        }

        for component in [&eastward, &northward] {
            let (nt, ny, nx) = component.shape();
            if component.values.len() != nt * ny * nx {
                return Err(GridError::malformed(format!(
                    "component '{}' has {} values, expected {} ({}x{}x{})",
                    component.name,
                    component.values.len(),
                    nt * ny * nx,
                    nt,
                    ny,
                    nx
                )));
            }
        }

        Self::new(
            eastward.times,
            eastward.latitudes,
            eastward.longitudes,
            eastward.values,
            northward.values,
        )
    }

    /// Build a field from shared coordinates and two value arrays.
    pub fn new(
        times: Vec<DateTime<Utc>>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        eastward: Vec<f32>,
        northward: Vec<f32>,
    ) -> Result<Self> {
        if times.is_empty() || latitudes.is_empty() || longitudes.is_empty() {
            return Err(GridError::malformed(format!(
                "empty axis (time={}, latitude={}, longitude={})",
                times.len(),
                latitudes.len(),
                longitudes.len()
            )));
        }

        let expected = times.len() * latitudes.len() * longitudes.len();
        if eastward.len() != expected || northward.len() != expected {
            return Err(GridError::malformed(format!(
                "component shapes disagree: eastward={}, northward={}, expected {}",
                eastward.len(),
                northward.len(),
                expected
            )));
        }

        check_ascending("latitude", &latitudes)?;
        check_ascending("longitude", &longitudes)?;
        let interval = uniform_interval(&times)?;

        Ok(Self {
            times,
            latitudes,
            longitudes,
            eastward,
            northward,
            interval,
        })
    }

    /// `(time, latitude, longitude)` extents.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.times.len(), self.latitudes.len(), self.longitudes.len())
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn eastward(&self) -> &[f32] {
        &self.eastward
    }

    pub fn northward(&self) -> &[f32] {
        &self.northward
    }

    /// Time between consecutive samples; `None` for a single time step.
    pub fn sampling_interval(&self) -> Option<TimeStep> {
        self.interval
    }

    /// Number of grid cells in one time step.
    pub fn cells_per_step(&self) -> usize {
        self.latitudes.len() * self.longitudes.len()
    }

    /// The u and v slices for one time step.
    pub fn step(&self, t: usize) -> (&[f32], &[f32]) {
        let n = self.cells_per_step();
        let range = t * n..(t + 1) * n;
        (&self.eastward[range.clone()], &self.northward[range])
    }

    /// Georeferencing of the lat/lon grid, anchored at the south-west corner.
    pub fn grid_spec(&self) -> Result<GridSpec> {
        GridSpec::from_axes(&self.longitudes, &self.latitudes)
            .ok_or_else(|| GridError::malformed("field has an empty coordinate axis"))
    }

    /// Check that both axes are equally spaced (a `regular_ll` grid).
    pub fn check_regular(&self) -> Result<()> {
        check_equal_spacing("latitude", &self.latitudes)?;
        check_equal_spacing("longitude", &self.longitudes)
    }

    /// Crop to a bounding box and a `[start, end)` time window.
    ///
    /// Returns `None` when nothing falls inside the window.
    pub fn window(
        &self,
        bbox: Option<&BoundingBox>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let times = index_range(&self.times, |t| {
            start.map_or(true, |s| *t >= s) && end.map_or(true, |e| *t < e)
        })?;
        let lats = index_range(&self.latitudes, |y| bbox.map_or(true, |b| b.contains_y(*y)))?;
        let lons = index_range(&self.longitudes, |x| bbox.map_or(true, |b| b.contains_x(*x)))?;

        Some(self.select(times, 1, lats, 1, lons, 1))
    }

    /// Keep every `*_step`-th index of each range.
    pub(crate) fn select(
        &self,
        times: Range<usize>,
        time_step: usize,
        lats: Range<usize>,
        lat_step: usize,
        lons: Range<usize>,
        lon_step: usize,
    ) -> Self {
        let t_idx: Vec<usize> = times.step_by(time_step).collect();
        let y_idx: Vec<usize> = lats.step_by(lat_step).collect();
        let x_idx: Vec<usize> = lons.step_by(lon_step).collect();

        let (_, ny, nx) = self.shape();
        let capacity = t_idx.len() * y_idx.len() * x_idx.len();
        let mut eastward = Vec::with_capacity(capacity);
        let mut northward = Vec::with_capacity(capacity);

        for &t in &t_idx {
            for &j in &y_idx {
                let row = t * ny * nx + j * nx;
                for &i in &x_idx {
                    eastward.push(self.eastward[row + i]);
                    northward.push(self.northward[row + i]);
                }
            }
        }

        let interval = self
            .interval
            .and_then(|i| TimeStep::from_minutes(i.minutes() * time_step as u32).ok());

        Self {
            times: t_idx.iter().map(|&t| self.times[t]).collect(),
            latitudes: y_idx.iter().map(|&j| self.latitudes[j]).collect(),
            longitudes: x_idx.iter().map(|&i| self.longitudes[i]).collect(),
            eastward,
            northward,
            interval,
        }
    }

    /// Concatenate fields along time (e.g. one file per forecast day).
    ///
    /// Parts are ordered by their first timestamp; samples that repeat or
    /// precede an already collected timestamp are dropped. All parts must
    /// share the same lat/lon coordinates.
    pub fn concat_time(mut parts: Vec<GriddedVectorField>) -> Result<Self> {
        if parts.is_empty() {
            return Err(GridError::malformed("no fields to concatenate"));
        }
        parts.sort_by_key(|p| p.times[0]);

        let first = &parts[0];
        let latitudes = first.latitudes.clone();
        let longitudes = first.longitudes.clone();
        let n = first.cells_per_step();

        let mut times = Vec::new();
        let mut eastward = Vec::new();
        let mut northward = Vec::new();
        let mut dropped = 0usize;

        for part in &parts {
            if part.latitudes != latitudes || part.longitudes != longitudes {
                return Err(GridError::malformed(
                    "cannot concatenate fields on different lat/lon grids",
                ));
            }
            for (t, time) in part.times.iter().enumerate() {
                if times.last().map_or(false, |last| time <= last) {
                    dropped += 1;
                    continue;
                }
                let (u, v) = part.step(t);
                times.push(*time);
                eastward.extend_from_slice(u);
                northward.extend_from_slice(v);
            }
        }

        if dropped > 0 {
            debug!(dropped, "Dropped overlapping time steps while concatenating");
        }
        debug_assert_eq!(eastward.len(), times.len() * n);

        Self::new(times, latitudes, longitudes, eastward, northward)
    }
}

fn check_ascending(axis: &str, values: &[f64]) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(GridError::malformed(format!("{} axis has non-finite values", axis)));
    }
    if values.windows(2).any(|w| w[1] <= w[0]) {
        return Err(GridError::malformed(format!(
            "{} axis is not strictly ascending",
            axis
        )));
    }
    Ok(())
}

fn check_equal_spacing(axis: &str, values: &[f64]) -> Result<()> {
    if values.len() < 3 {
        return Ok(());
    }
    let reference = values[1] - values[0];
    let tolerance = reference.abs() * SPACING_TOLERANCE;
    for (k, w) in values.windows(2).enumerate() {
        let spacing = w[1] - w[0];
        if (spacing - reference).abs() > tolerance {
            return Err(GridError::malformed(format!(
                "{} axis is not equally spaced: step {} is {}, expected {}",
                axis, k, spacing, reference
            )));
        }
    }
    Ok(())
}

fn uniform_interval(times: &[DateTime<Utc>]) -> Result<Option<TimeStep>> {
    if times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(GridError::malformed("time axis is not strictly ascending"));
    }
    let Some(first) = times.windows(2).next().map(|w| w[1] - w[0]) else {
        return Ok(None);
    };
    if times.windows(2).any(|w| w[1] - w[0] != first) {
        return Err(GridError::malformed("time axis is not uniformly sampled"));
    }
    if first.num_seconds() % 60 != 0 {
        return Err(GridError::malformed(format!(
            "time step of {}s is not a whole number of minutes",
            first.num_seconds()
        )));
    }
    TimeStep::from_minutes(first.num_minutes() as u32)
        .map(Some)
        .map_err(|e| GridError::malformed(e.to_string()))
}

/// Contiguous index range of the elements matching `keep`.
fn index_range<T>(values: &[T], keep: impl Fn(&T) -> bool) -> Option<Range<usize>> {
    let start = values.iter().position(&keep)?;
    let end = values.iter().rposition(&keep)? + 1;
    Some(start..end)
}
