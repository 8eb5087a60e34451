//! Dataset source collaborator.

use chrono::{DateTime, Utc};
use tide_common::BoundingBox;

use crate::error::Result;
use crate::field::GriddedVectorField;

/// Which dataset, area and time window to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRequest {
    pub dataset_id: String,
    /// Inclusive start of the time window
    pub start: DateTime<Utc>,
    /// Exclusive end of the time window
    pub end: DateTime<Utc>,
    /// Optional crop; `None` keeps the whole product domain
    pub bbox: Option<BoundingBox>,
}

impl DatasetRequest {
    pub fn new(dataset_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            start,
            end,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// Supplies u/v current fields in m/s on a regular lat/lon grid.
///
/// Implementations report any failure (missing files, unknown dataset,
/// unreadable data) as `GridError::UpstreamUnavailable`. Callers do not retry.
pub trait DatasetSource {
    fn fetch(&self, request: &DatasetRequest) -> Result<GriddedVectorField>;
}
