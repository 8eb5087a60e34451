//! Dataset source over downloaded Copernicus Marine forecast files.
//!
//! The Copernicus Marine toolbox stores one NetCDF file per forecast day, e.g.
//!
//! ```text
//! <dir>/NWSHELF_ANALYSISFORECAST_PHY_004_013/
//!     cmems_mod_nws_phy_anfc_0.027deg-2D_PT15M-i_202411/2025/07/
//!         MetO-NWS-PHY-15min-CUR_20250711_b20250710_FC_R20250710.nc
//! ```
//!
//! A file belongs to a request when its name carries `_YYYYMMDD_` for one of
//! the requested days, followed by the forecast marker (`FC`), and ends in
//! `.nc`. Files in subdirectories must sit under a directory whose name starts
//! with the dataset id; files directly in the input directory are always
//! considered.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use current_grid::{DatasetRequest, DatasetSource, GriddedVectorField, Result as GridResult};
use tracing::{debug, info, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::read_current_file;

/// Variable names and file conventions of a forecast product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductLayout {
    pub eastward_variable: String,
    pub northward_variable: String,
    /// Marker after the date identifying forecast (not analysis) files
    pub forecast_marker: String,
}

impl Default for ProductLayout {
    fn default() -> Self {
        Self {
            eastward_variable: "uo".to_string(),
            northward_variable: "vo".to_string(),
            forecast_marker: "FC".to_string(),
        }
    }
}

/// Reads forecast files for the requested days from a local directory.
#[derive(Debug, Clone)]
pub struct CopernicusSource {
    input_dir: PathBuf,
    layout: ProductLayout,
}

impl CopernicusSource {
    pub fn new(input_dir: impl Into<PathBuf>, layout: ProductLayout) -> Self {
        Self {
            input_dir: input_dir.into(),
            layout,
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Forecast files for the request, sorted by file name.
    pub fn forecast_files(&self, request: &DatasetRequest) -> NetCdfResult<Vec<PathBuf>> {
        let dates = request_dates(request.start, request.end);
        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(&self.input_dir) {
            let entry = entry.map_err(|e| NetCdfError::IoError(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !matches_forecast_name(name, &dates, &self.layout.forecast_marker) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.input_dir)
                .unwrap_or_else(|_| entry.path());
            if !under_dataset_dir(relative, &request.dataset_id) {
                debug!(path = %entry.path().display(), "Skipping file from another dataset");
                continue;
            }

            files.push(entry.into_path());
        }

        if files.is_empty() {
            return Err(NetCdfError::NoForecastFiles {
                dir: self.input_dir.display().to_string(),
                dates: dates.join(", "),
            });
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        files.dedup_by(|a, b| a.file_name() == b.file_name());
        Ok(files)
    }

    fn load(&self, request: &DatasetRequest) -> NetCdfResult<GriddedVectorField> {
        let files = self.forecast_files(request)?;
        info!(
            dataset = %request.dataset_id,
            files = files.len(),
            dir = %self.input_dir.display(),
            "Reading forecast files"
        );

        let parts = files
            .iter()
            .map(|path| {
                read_current_file(
                    path,
                    &self.layout.eastward_variable,
                    &self.layout.northward_variable,
                )
            })
            .collect::<NetCdfResult<Vec<_>>>()?;

        let field = GriddedVectorField::concat_time(parts)?;
        let field = field
            .window(request.bbox.as_ref(), Some(request.start), Some(request.end))
            .ok_or_else(|| {
                NetCdfError::InvalidFormat(format!(
                    "no samples between {} and {} inside the requested area",
                    request.start, request.end
                ))
            })?;

        if field.times().len() == 1 {
            warn!(time = %field.times()[0], "Only one time step inside the requested window");
        }

        Ok(field)
    }
}

impl DatasetSource for CopernicusSource {
    fn fetch(&self, request: &DatasetRequest) -> GridResult<GriddedVectorField> {
        self.load(request)
            .map_err(|e| e.into_grid_error(&request.dataset_id))
    }
}

/// `YYYYMMDD` strings for each calendar day touched by `[start, end)`.
pub fn request_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<String> {
    let first: NaiveDate = start.date_naive();
    let last: NaiveDate = if end > start {
        (end - Duration::seconds(1)).date_naive()
    } else {
        first
    };

    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| d.format("%Y%m%d").to_string())
        .collect()
}

/// `.*_(date)_.*<marker>.*\.nc`
fn matches_forecast_name(name: &str, dates: &[String], marker: &str) -> bool {
    if !name.ends_with(".nc") {
        return false;
    }
    dates.iter().any(|date| {
        let tag = format!("_{}_", date);
        name.find(&tag)
            .map_or(false, |pos| name[pos + tag.len()..].contains(marker))
    })
}

fn under_dataset_dir(relative: &Path, dataset_id: &str) -> bool {
    let mut dirs = relative.parent().into_iter().flat_map(|p| p.components()).peekable();
    if dirs.peek().is_none() {
        return true;
    }
    dirs.any(|c| c.as_os_str().to_string_lossy().starts_with(dataset_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_request_dates() {
        let start = Utc.with_ymd_and_hms(2025, 7, 11, 0, 0, 0).unwrap();
        let dates = request_dates(start, start + Duration::days(3));
        assert_eq!(dates, vec!["20250711", "20250712", "20250713"]);

        let dates = request_dates(start + Duration::hours(6), start + Duration::hours(7));
        assert_eq!(dates, vec!["20250711"]);
    }

    #[test]
    fn test_matches_forecast_name() {
        let dates = vec!["20250711".to_string()];
        assert!(matches_forecast_name(
            "MetO-NWS-PHY-15min-CUR_20250711_b20250710_FC_R20250710.nc",
            &dates,
            "FC"
        ));
        // Analysis file for the same day
        assert!(!matches_forecast_name(
            "MetO-NWS-PHY-15min-CUR_20250711_b20250710_HC_R20250710.nc",
            &dates,
            "FC"
        ));
        // Wrong day
        assert!(!matches_forecast_name(
            "MetO-NWS-PHY-15min-CUR_20250712_b20250710_FC_R20250710.nc",
            &dates,
            "FC"
        ));
        assert!(!matches_forecast_name(
            "MetO-NWS-PHY-15min-CUR_20250711_b20250710_FC_R20250710.nc.partial",
            &dates,
            "FC"
        ));
    }

    #[test]
    fn test_under_dataset_dir() {
        let id = "cmems_mod_nws_phy_anfc_0.027deg-2D_PT15M-i";
        assert!(under_dataset_dir(Path::new("file.nc"), id));
        assert!(under_dataset_dir(
            Path::new("NWSHELF/cmems_mod_nws_phy_anfc_0.027deg-2D_PT15M-i_202411/2025/07/file.nc"),
            id
        ));
        assert!(!under_dataset_dir(
            Path::new("NWSHELF/cmems_mod_nws_phy_anfc_0.027deg-3D_P1D-m_202411/2025/07/file.nc"),
            id
        ));
    }
}
