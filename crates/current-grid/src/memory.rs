//! In-memory collaborators for tests and dry runs.

use crate::emit::OutputRecord;
use crate::error::{GridError, Result};
use crate::field::GriddedVectorField;
use crate::sink::RecordSink;
use crate::source::{DatasetRequest, DatasetSource};

/// Serves a fixed field, cropped to the requested window.
#[derive(Debug, Clone)]
pub struct MemorySource {
    field: Option<GriddedVectorField>,
    failure: Option<String>,
}

impl MemorySource {
    pub fn new(field: GriddedVectorField) -> Self {
        Self {
            field: Some(field),
            failure: None,
        }
    }

    /// A source whose every fetch fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            field: None,
            failure: Some(reason.into()),
        }
    }
}

impl DatasetSource for MemorySource {
    fn fetch(&self, request: &DatasetRequest) -> Result<GriddedVectorField> {
        if let Some(reason) = &self.failure {
            return Err(GridError::upstream(&request.dataset_id, reason.clone()));
        }
        let field = self
            .field
            .as_ref()
            .ok_or_else(|| GridError::upstream(&request.dataset_id, "no field loaded"))?;

        field
            .window(request.bbox.as_ref(), Some(request.start), Some(request.end))
            .ok_or_else(|| GridError::upstream(&request.dataset_id, "no data in requested window"))
    }
}

/// Collects records in memory; can be told to fail after N writes.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<OutputRecord>,
    pub finished: bool,
    pub aborted: bool,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the write after `n` records have been accepted.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, record: &OutputRecord) -> Result<()> {
        if self.fail_after.map_or(false, |n| self.records.len() >= n) {
            return Err(GridError::output_failed("disk full"));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.records.clear();
        self.aborted = true;
    }
}
