//! NetCDF reader for ocean current forecasts.
//!
//! Reads eastward/northward surface current components (`uo`/`vo` in the
//! Copernicus Marine North-West Shelf products) from CF-convention NetCDF-4
//! files and serves them to the conversion pipeline as a
//! [`current_grid::DatasetSource`].
//!
//! # Implementation Notes
//!
//! Files are read with the `netcdf` crate, which links libnetcdf and HDF5.
//! System requirements: libhdf5-dev libnetcdf-dev.

pub mod cf_time;
pub mod copernicus;
pub mod error;
pub mod native;

pub use cf_time::TimeUnits;
pub use copernicus::{request_dates, CopernicusSource, ProductLayout};
pub use error::{NetCdfError, NetCdfResult};
pub use native::{read_current_file, silence_hdf5_errors};
