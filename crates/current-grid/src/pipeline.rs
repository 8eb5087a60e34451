//! Source → resample → convert → emit → sink.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::emit::Emitter;
use crate::error::{GridError, PipelineError, Stage};
use crate::field::GriddedVectorField;
use crate::polar::convert_step;
use crate::resample::{resample, ResamplingSpec};
use crate::sink::RecordSink;
use crate::source::{DatasetRequest, DatasetSource};

/// Everything one run needs, passed by value.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub request: DatasetRequest,
    pub resampling: ResamplingSpec,
    /// Reference time written to every record; defaults to the first output step
    pub reference_time: Option<DateTime<Utc>>,
    /// Also emit the u/v components after speed and bearing
    pub include_components: bool,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub steps: usize,
    pub records: usize,
    pub nx: usize,
    pub ny: usize,
    /// Cells with zero current whose bearing is the calm placeholder
    pub calm_cells: usize,
    /// Cells with no data (land)
    pub missing_cells: usize,
    pub reference_time: DateTime<Utc>,
    pub first_valid_time: DateTime<Utc>,
    pub last_valid_time: DateTime<Utc>,
}

/// Run the whole transformation, streaming one time step at a time into `sink`.
///
/// Either every record is written and the sink finished, or the sink is
/// aborted and the error reports the failing stage.
pub fn run_pipeline<S, K>(
    config: PipelineConfig,
    source: &S,
    sink: &mut K,
) -> Result<PipelineSummary, PipelineError>
where
    S: DatasetSource + ?Sized,
    K: RecordSink + ?Sized,
{
    info!(
        dataset = %config.request.dataset_id,
        start = %config.request.start,
        end = %config.request.end,
        spatial_stride = config.resampling.spatial_stride,
        temporal_stride = %config.resampling.temporal_stride,
        "Starting current conversion"
    );

    match convert(config, source, sink) {
        Ok(summary) => {
            info!(
                steps = summary.steps,
                records = summary.records,
                calm_cells = summary.calm_cells,
                missing_cells = summary.missing_cells,
                "Current conversion complete"
            );
            Ok(summary)
        }
        Err(e) => {
            warn!(error = %e, "Aborting output");
            sink.abort();
            Err(e)
        }
    }
}

fn convert<S, K>(
    config: PipelineConfig,
    source: &S,
    sink: &mut K,
) -> Result<PipelineSummary, PipelineError>
where
    S: DatasetSource + ?Sized,
    K: RecordSink + ?Sized,
{
    let raw = source
        .fetch(&config.request)
        .map_err(|e| PipelineError::new(Stage::Source, e))?;
    let (nt, ny, nx) = raw.shape();
    info!(steps = nt, ny, nx, "Fetched source field");

    let field =
        resample(&raw, &config.resampling).map_err(|e| PipelineError::new(Stage::Resample, e))?;
    drop(raw);

    let reference_time = config.reference_time.unwrap_or(field.times()[0]);
    let emitter = Emitter::new(&field, reference_time, config.include_components)
        .map_err(|e| PipelineError::new(Stage::Emit, e))?;
    debug!(
        fields = ?emitter.fields(),
        nx = emitter.grid().nx,
        ny = emitter.grid().ny,
        reference_time = %reference_time,
        "Emitting records"
    );

    write_steps(&field, &emitter, sink)
}

fn write_steps<K>(
    field: &GriddedVectorField,
    emitter: &Emitter,
    sink: &mut K,
) -> Result<PipelineSummary, PipelineError>
where
    K: RecordSink + ?Sized,
{
    let (nt, ny, nx) = field.shape();
    let mut records = 0usize;
    let mut calm_cells = 0usize;
    let mut missing_cells = 0usize;

    for t in 0..nt {
        let (u, v) = field.step(t);
        let polar = convert_step(u, v).map_err(|e| PipelineError::new(Stage::Convert, e))?;
        calm_cells += polar.calm_count();
        missing_cells += polar.missing_count();

        let step_records = emitter
            .emit_step(t, &polar, u, v)
            .map_err(|e| PipelineError::new(Stage::Emit, e))?;

        for record in &step_records {
            sink.write(record)
                .map_err(|e| PipelineError::new(Stage::Output, output_error(e)))?;
        }
        records += step_records.len();

        debug!(
            step = t,
            valid_time = %field.times()[t],
            calm = polar.calm_count(),
            "Wrote time step"
        );
    }

    if calm_cells > 0 {
        warn!(
            calm_cells,
            "Zero-current cells written with bearing 0 as a placeholder (no direction)"
        );
    }

    sink.finish()
        .map_err(|e| PipelineError::new(Stage::Output, output_error(e)))?;

    Ok(PipelineSummary {
        steps: nt,
        records,
        nx,
        ny,
        calm_cells,
        missing_cells,
        reference_time: emitter.reference_time(),
        first_valid_time: field.times()[0],
        last_valid_time: field.times()[nt - 1],
    })
}

fn output_error(e: GridError) -> GridError {
    match e {
        GridError::OutputFailed(_) => e,
        other => GridError::output_failed(other.to_string()),
    }
}
