//! Shared test utilities for the tidal-current workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Skip macros for optional test data
//! - Synthetic current field generators
//! - Common test fixtures
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// Real Copernicus forecast files are large and need an account to fetch, so
/// tests that read them return early when the file is absent.
///
/// ```ignore
/// let path = require_test_file!(product::SAMPLE_FILE);
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// ```ignore
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Relative equality: `|left - right| <= tolerance * |right|`.
///
/// Falls back to an absolute comparison when `right` is zero.
#[macro_export]
macro_rules! assert_relative_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let tolerance: f64 = $tolerance as f64;
        let bound = if right == 0.0 { tolerance } else { tolerance * right.abs() };
        if (left - right).abs() > bound {
            panic!(
                "assertion failed: `(left ≈ right)` within relative {:?}\n  left: `{:?}`,\n right: `{:?}`",
                tolerance, left, right
            );
        }
    }};
}

/// Compass bearings equal within `epsilon` degrees, treating 359.99 and 0 as close.
#[macro_export]
macro_rules! assert_bearing_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let diff = (left - right).rem_euclid(360.0);
        let diff = diff.min(360.0 - diff);
        if diff > $epsilon as f64 {
            panic!(
                "assertion failed: bearings differ by {:?} degrees\n  left: `{:?}`,\n right: `{:?}`",
                diff, left, right
            );
        }
    }};
}
