//! Generators for synthetic current fields.
//!
//! Grids are row-major with row 0 the southernmost, matching the storage
//! order used across the workspace.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Creates a grid with predictable values: `col * 1000 + row`.
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// `n` equally spaced coordinates starting at `start`.
pub fn create_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|k| start + k as f64 * step).collect()
}

/// `n` timestamps `step_minutes` apart starting at `start`.
pub fn create_times(start: DateTime<Utc>, step_minutes: i64, n: usize) -> Vec<DateTime<Utc>> {
    (0..n)
        .map(|k| start + Duration::minutes(step_minutes * k as i64))
        .collect()
}

/// Midnight UTC on the given day.
pub fn midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid calendar date")
}

/// A semi-diurnal tidal current: every cell flows along one axis with a
/// speed that oscillates over a 12h25m period.
///
/// Returns `(u, v)` for `steps` time steps, each `step_minutes` apart.
pub fn create_tidal_current(
    width: usize,
    height: usize,
    steps: usize,
    step_minutes: i64,
    peak: f32,
    heading_degrees: f32,
) -> (Vec<f32>, Vec<f32>) {
    const PERIOD_MINUTES: f32 = 745.0;
    let heading = heading_degrees.to_radians();
    let n = width * height * steps;
    let mut u = Vec::with_capacity(n);
    let mut v = Vec::with_capacity(n);

    for t in 0..steps {
        let phase = 2.0 * std::f32::consts::PI * (t as i64 * step_minutes) as f32 / PERIOD_MINUTES;
        let speed = peak * phase.cos();
        for _ in 0..width * height {
            u.push(speed * heading.sin());
            v.push(speed * heading.cos());
        }
    }
    (u, v)
}

/// One time step where the current direction sweeps through every compass
/// heading across the grid, at constant speed.
pub fn create_rotating_current(width: usize, height: usize, speed: f32) -> (Vec<f32>, Vec<f32>) {
    let n = width * height;
    let mut u = Vec::with_capacity(n);
    let mut v = Vec::with_capacity(n);
    for k in 0..n {
        let heading = (k as f32 / n as f32 * 360.0).to_radians();
        u.push(speed * heading.sin());
        v.push(speed * heading.cos());
    }
    (u, v)
}

/// Creates a grid with NaN (land) at the given `(col, row)` positions, zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[11], 1001.0);
    }

    #[test]
    fn test_create_axis_and_times() {
        let axis = create_axis(-4.0, 0.5, 3);
        assert_eq!(axis, vec![-4.0, -3.5, -3.0]);

        let t0 = midnight(2025, 7, 11);
        let times = create_times(t0, 15, 4);
        assert_eq!(times[3] - times[0], Duration::minutes(45));
    }

    #[test]
    fn test_tidal_current_heading() {
        let (u, v) = create_tidal_current(3, 2, 2, 15, 1.5, 90.0);
        assert_eq!(u.len(), 12);
        // Flowing east at t=0
        assert!((u[0] - 1.5).abs() < 1e-6);
        assert!(v[0].abs() < 1e-6);
        // Speed falls off as the tide turns
        assert!(u[6] < u[0]);
    }

    #[test]
    fn test_rotating_current_constant_speed() {
        let (u, v) = create_rotating_current(8, 8, 2.0);
        for (a, b) in u.iter().zip(&v) {
            assert!((a.hypot(*b) - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, &[(5, 5), (0, 0)]);
        assert!(grid[0].is_nan());
        assert!(grid[55].is_nan());
        assert!(!grid[1].is_nan());
    }
}
