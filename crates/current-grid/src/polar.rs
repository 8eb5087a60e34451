//! Conversion of u/v current components to speed and compass bearing.

use rayon::prelude::*;

use crate::error::{GridError, Result};

/// Knots in one metre per second.
pub const KNOTS_PER_METRE_PER_SECOND: f64 = 1.9438444924;

/// Direction the current flows towards, clockwise from true north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bearing {
    /// A real heading in `[0, 360)`.
    Defined(f64),
    /// Zero current. There is no direction; 0 is written as a placeholder and
    /// must not be read as "flowing north".
    Calm,
    /// The cell has no data (land or fill value).
    Missing,
}

impl Bearing {
    /// Numeric value written to output: 0 for calm, NaN for missing.
    pub fn degrees(&self) -> f64 {
        match self {
            Bearing::Defined(d) => *d,
            Bearing::Calm => 0.0,
            Bearing::Missing => f64::NAN,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Bearing::Calm)
    }
}

/// Speed and bearing of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarCell {
    pub speed_knots: f64,
    pub bearing: Bearing,
}

/// Convert one u/v pair (m/s) to speed in knots and compass bearing.
pub fn to_polar(u: f64, v: f64) -> PolarCell {
    if u.is_nan() || v.is_nan() {
        return PolarCell {
            speed_knots: f64::NAN,
            bearing: Bearing::Missing,
        };
    }

    let speed_knots = u.hypot(v) * KNOTS_PER_METRE_PER_SECOND;

    if u == 0.0 && v == 0.0 {
        return PolarCell {
            speed_knots,
            bearing: Bearing::Calm,
        };
    }

    // atan2 is counter-clockwise from east; compass bearings run clockwise from north
    let mut bearing = (90.0 - v.atan2(u).to_degrees()).rem_euclid(360.0);
    if bearing >= 360.0 {
        bearing = 0.0;
    }

    PolarCell {
        speed_knots,
        bearing: Bearing::Defined(bearing),
    }
}

/// Speed and bearing for every cell of one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarField {
    pub cells: Vec<PolarCell>,
}

impl PolarField {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn speeds(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.speed_knots).collect()
    }

    pub fn bearings(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.bearing.degrees()).collect()
    }

    /// Flat indices of cells whose bearing is the calm placeholder.
    pub fn placeholder_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.bearing.is_placeholder())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn calm_count(&self) -> usize {
        self.cells.iter().filter(|c| c.bearing.is_placeholder()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c.bearing, Bearing::Missing))
            .count()
    }
}

/// Convert one time step of u/v values, cell by cell in parallel.
pub fn convert_step(u: &[f32], v: &[f32]) -> Result<PolarField> {
    if u.len() != v.len() {
        return Err(GridError::malformed(format!(
            "u has {} cells but v has {}",
            u.len(),
            v.len()
        )));
    }

    let cells = u
        .par_iter()
        .zip(v.par_iter())
        .map(|(&u, &v)| to_polar(u as f64, v as f64))
        .collect();

    Ok(PolarField { cells })
}
