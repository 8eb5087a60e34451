//! Tidal-current grid transformation core.
//!
//! Turns a gridded eastward/northward current field (m/s) into speed
//! (knots) and bearing (degrees true) records ready for GRIB2 encoding.
//!
//! # Architecture
//!
//! ```text
//! DatasetSource::fetch(request)
//!      │
//!      ▼
//! GriddedVectorField ──► resample(spatial stride, temporal stride)
//!                              │
//!                              ▼  one time step at a time
//!                        convert_step (u, v) ──► PolarField
//!                              │
//!                              ▼
//!                        Emitter::emit_step ──► OutputRecord (speed, bearing[, u, v])
//!                              │
//!                              ▼
//!                        RecordSink::write / finish
//! ```
//!
//! Every stage is a pure transformation except the two collaborators at the
//! ends, which are traits so the core can run against in-memory fakes.

pub mod emit;
pub mod error;
pub mod field;
pub mod memory;
pub mod pipeline;
pub mod polar;
pub mod resample;
pub mod sink;
pub mod source;

pub use emit::{Emitter, FieldKind, OutputRecord};
pub use error::{GridError, PipelineError, Result, Stage};
pub use field::{ComponentGrid, GriddedVectorField};
pub use memory::{MemorySink, MemorySource};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineSummary};
pub use polar::{convert_step, to_polar, Bearing, PolarCell, PolarField, KNOTS_PER_METRE_PER_SECOND};
pub use resample::{resample, ResamplingSpec};
pub use sink::RecordSink;
pub use source::{DatasetRequest, DatasetSource};

pub use tide_common::{BoundingBox, GridSpec, ScanMode, TimeStep, ValidTime};
