//! Regular lat/lon grid georeferencing.

use serde::{Deserialize, Serialize};

/// Specification of a regular (equally spaced) lat/lon grid.
///
/// `first_x`/`first_y` is the first grid point in storage order. For grids
/// produced by this workspace that is always the south-west corner, with
/// rows running south to north.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points in X (longitude) direction
    pub nx: usize,
    /// Number of points in Y (latitude) direction
    pub ny: usize,
    /// Longitude spacing in degrees
    pub dx: f64,
    /// Latitude spacing in degrees
    pub dy: f64,
    /// First grid point longitude
    pub first_x: f64,
    /// First grid point latitude
    pub first_y: f64,
    /// Scan mode flags (determines how data is ordered)
    pub scan_mode: ScanMode,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
        first_x: f64,
        first_y: f64,
        scan_mode: ScanMode,
    ) -> Self {
        Self {
            nx,
            ny,
            dx,
            dy,
            first_x,
            first_y,
            scan_mode,
        }
    }

    /// Build a south-west anchored spec from ascending coordinate axes.
    ///
    /// Spacing is taken from the first two samples of each axis; a single
    /// sample axis has zero spacing. Returns `None` for empty axes.
    pub fn from_axes(longitudes: &[f64], latitudes: &[f64]) -> Option<Self> {
        let first_x = *longitudes.first()?;
        let first_y = *latitudes.first()?;
        let dx = longitudes.get(1).map_or(0.0, |x| x - first_x);
        let dy = latitudes.get(1).map_or(0.0, |y| y - first_y);

        Some(Self::new(
            longitudes.len(),
            latitudes.len(),
            dx,
            dy,
            first_x,
            first_y,
            ScanMode::south_to_north(),
        ))
    }

    /// Longitude of the last grid point.
    pub fn last_x(&self) -> f64 {
        self.first_x + self.nx.saturating_sub(1) as f64 * self.dx
    }

    /// Latitude of the last grid point.
    pub fn last_y(&self) -> f64 {
        self.first_y + self.ny.saturating_sub(1) as f64 * self.dy
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// Scan mode flags for grid data ordering.
///
/// Based on GRIB2 scanning mode (Flag Table 3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMode {
    /// +i direction: false = +x (east), true = -x (west)
    pub i_negative: bool,
    /// +j direction: false = -y (south), true = +y (north)
    pub j_positive: bool,
    /// Adjacent points: false = i direction, true = j direction
    pub j_consecutive: bool,
}

impl ScanMode {
    /// Rows run west to east, first row is the southernmost.
    pub fn south_to_north() -> Self {
        Self {
            i_negative: false,
            j_positive: true,
            j_consecutive: false,
        }
    }

    /// Encode as a GRIB2 flag byte.
    pub fn to_grib2_flag(&self) -> u8 {
        let mut flag = 0u8;
        if self.i_negative {
            flag |= 0x80;
        }
        if self.j_positive {
            flag |= 0x40;
        }
        if self.j_consecutive {
            flag |= 0x20;
        }
        flag
    }
}
