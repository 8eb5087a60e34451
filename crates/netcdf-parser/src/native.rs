//! Reading u/v current components with the native netcdf library.

use std::path::Path;
use std::sync::Once;

use chrono::{DateTime, Utc};
use current_grid::{ComponentGrid, GriddedVectorField};
use tracing::debug;

use crate::cf_time::TimeUnits;
use crate::error::{NetCdfError, NetCdfResult};

const LATITUDE_NAMES: [&str; 3] = ["latitude", "lat", "nav_lat"];
const LONGITUDE_NAMES: [&str; 3] = ["longitude", "lon", "nav_lon"];
const TIME_NAMES: [&str; 2] = ["time", "time_counter"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints `HDF5-DIAG` traces even when a lookup for an
/// optional attribute fails and is handled here. Call once early in `main`,
/// before any file is opened; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a documented
        // way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read one forecast file into a u/v field.
///
/// Packed values are unpacked with `scale_factor`/`add_offset`, fill values
/// become NaN, and rows stored north to south are flipped so latitude always
/// ascends. A depth dimension between time and latitude is reduced to its
/// first (surface) level.
pub fn read_current_file(
    path: &Path,
    eastward: &str,
    northward: &str,
) -> NetCdfResult<GriddedVectorField> {
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| NetCdfError::library(path.display(), e))?;

    let mut latitudes = read_coordinate(&file, &LATITUDE_NAMES, path)?;
    let longitudes = read_coordinate(&file, &LONGITUDE_NAMES, path)?;
    let times = read_times(&file, path)?;
    let shape = (times.len(), latitudes.len(), longitudes.len());

    let mut u = read_component(&file, eastward, shape, path)?;
    let mut v = read_component(&file, northward, shape, path)?;

    if latitudes.len() > 1 && latitudes[0] > latitudes[latitudes.len() - 1] {
        latitudes.reverse();
        flip_rows(&mut u, shape);
        flip_rows(&mut v, shape);
        debug!(path = %path.display(), "Flipped north-to-south rows");
    }

    debug!(
        path = %path.display(),
        steps = shape.0,
        ny = shape.1,
        nx = shape.2,
        "Read current components"
    );

    let field = GriddedVectorField::from_components(
        ComponentGrid::new(eastward, times.clone(), latitudes.clone(), longitudes.clone(), u),
        ComponentGrid::new(northward, times, latitudes, longitudes, v),
    )?;
    Ok(field)
}

fn find_variable<'f>(file: &'f netcdf::File, names: &[&str]) -> Option<netcdf::Variable<'f>> {
    names.iter().find_map(|name| file.variable(name))
}

fn read_coordinate(file: &netcdf::File, names: &[&str], path: &Path) -> NetCdfResult<Vec<f64>> {
    let var = find_variable(file, names)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", names[0])))?;
    if var.dimensions().len() != 1 {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} is not a 1-D coordinate (curvilinear grids are not supported)",
            var.name()
        )));
    }
    var.get_values::<f64, _>(..)
        .map_err(|e| NetCdfError::library(path.display(), e))
}

fn read_times(file: &netcdf::File, path: &Path) -> NetCdfResult<Vec<DateTime<Utc>>> {
    let var = find_variable(file, &TIME_NAMES)
        .ok_or_else(|| NetCdfError::MissingData("time variable".to_string()))?;
    let units = get_str_attr(&var, "units")
        .ok_or_else(|| NetCdfError::MissingData("time units attribute".to_string()))?;
    let values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::library(path.display(), e))?;

    TimeUnits::parse(&units)?.decode_all(&values)
}

fn read_component(
    file: &netcdf::File,
    name: &str,
    (nt, ny, nx): (usize, usize, usize),
    path: &Path,
) -> NetCdfResult<Vec<f32>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;

    let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let levels = match dims.as_slice() {
        [t, y, x] if (*t, *y, *x) == (nt, ny, nx) => 1,
        [t, z, y, x] if (*t, *y, *x) == (nt, ny, nx) && *z > 0 => *z,
        _ => {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has dimensions {:?}, expected (time={}, latitude={}, longitude={})",
                name, dims, nt, ny, nx
            )))
        }
    };

    let scale = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
    let fill = get_f64_attr(&var, "_FillValue");
    let missing = get_f64_attr(&var, "missing_value");

    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::library(path.display(), e))?;

    let plane = ny * nx;
    let mut values = Vec::with_capacity(nt * plane);
    for t in 0..nt {
        // First level only when a depth axis is present
        let start = t * levels * plane;
        values.extend(raw[start..start + plane].iter().map(|&r| {
            if !r.is_finite() || Some(r) == fill || Some(r) == missing {
                f32::NAN
            } else {
                (r * scale + offset) as f32
            }
        }));
    }

    Ok(values)
}

/// Reverse row order within every time step.
fn flip_rows(values: &mut [f32], (_, ny, nx): (usize, usize, usize)) {
    for step in values.chunks_mut(ny * nx) {
        for j in 0..ny / 2 {
            let (top, bottom) = step.split_at_mut((ny - 1 - j) * nx);
            top[j * nx..(j + 1) * nx].swap_with_slice(&mut bottom[..nx]);
        }
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_rows() {
        // 2 steps of 3 rows x 2 columns
        let mut values: Vec<f32> = (0..12).map(|k| k as f32).collect();
        flip_rows(&mut values, (2, 3, 2));
        assert_eq!(
            values,
            vec![4.0, 5.0, 2.0, 3.0, 0.0, 1.0, 10.0, 11.0, 8.0, 9.0, 6.0, 7.0]
        );
    }

    #[test]
    fn test_flip_rows_even() {
        let mut values = vec![0.0, 1.0, 2.0, 3.0];
        flip_rows(&mut values, (1, 2, 2));
        assert_eq!(values, vec![2.0, 3.0, 0.0, 1.0]);
    }
}
