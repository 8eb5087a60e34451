//! End-to-end tests for the current conversion pipeline, using in-memory
//! source and sink.

use chrono::Duration;
use current_grid::{
    resample, run_pipeline, BoundingBox, ComponentGrid, DatasetRequest, FieldKind, GridError,
    GriddedVectorField, MemorySink, MemorySource, PipelineConfig, ResamplingSpec, Stage,
    TimeStep,
};
use test_utils::{
    assert_approx_eq, assert_bearing_eq, assert_relative_eq, create_axis, create_rotating_current,
    create_test_grid, create_tidal_current, create_times, midnight, product, scenario,
};

fn step(s: &str) -> TimeStep {
    s.parse().unwrap()
}

/// Resampling of a quarter-hourly source.
fn spec(spatial_stride: usize, temporal_stride: &str) -> ResamplingSpec {
    ResamplingSpec::new(spatial_stride, step(temporal_stride), step("15m"))
}

fn scenario_field() -> GriddedVectorField {
    let t0 = midnight(2025, 7, 11);
    GriddedVectorField::new(
        create_times(t0, 15, 2),
        scenario::LATITUDES.to_vec(),
        scenario::LONGITUDES.to_vec(),
        scenario::U.to_vec(),
        scenario::V.to_vec(),
    )
    .unwrap()
}

fn tidal_field(nt: usize, ny: usize, nx: usize) -> GriddedVectorField {
    let (u, v) = create_tidal_current(nx, ny, nt, 15, 1.8, 45.0);
    GriddedVectorField::new(
        create_times(midnight(2025, 7, 11), 15, nt),
        create_axis(50.0, product::SPACING_DEGREES, ny),
        create_axis(-2.0, product::SPACING_DEGREES, nx),
        u,
        v,
    )
    .unwrap()
}

fn config(field: &GriddedVectorField, resampling: ResamplingSpec) -> PipelineConfig {
    let start = field.times()[0];
    PipelineConfig {
        request: DatasetRequest::new(product::DATASET_ID, start, start + Duration::days(1)),
        resampling,
        reference_time: None,
        include_components: false,
    }
}

#[test]
fn test_end_to_end_two_by_two() {
    let field = scenario_field();
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();

    let summary = run_pipeline(
        config(&field, ResamplingSpec::identity(step("15m"))),
        &source,
        &mut sink,
    )
    .unwrap();

    assert!(sink.finished);
    assert!(!sink.aborted);
    assert_eq!(summary.steps, 2);
    assert_eq!(summary.records, 4);
    assert_eq!(summary.calm_cells, 4);
    assert_eq!(sink.records.len(), 4);

    let kinds: Vec<FieldKind> = sink.records.iter().map(|r| r.field).collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::CurrentSpeed,
            FieldKind::CurrentDirection,
            FieldKind::CurrentSpeed,
            FieldKind::CurrentDirection,
        ]
    );

    let speed = &sink.records[0];
    assert_eq!(speed.units(), "knots");
    assert_relative_eq!(speed.values[0], scenario::FAST_KNOTS, 1e-9);
    assert_eq!(speed.values[1], 0.0);
    assert_eq!(speed.values[2], 0.0);
    assert_relative_eq!(speed.values[3], scenario::FAST_KNOTS, 1e-9);

    let bearing = &sink.records[1];
    assert_approx_eq!(bearing.values[0], scenario::NORTH_EAST_BEARING, 1e-6);
    assert_eq!(bearing.values[1], 0.0);
    assert_eq!(bearing.values[2], 0.0);
    assert_approx_eq!(bearing.values[3], scenario::SOUTH_WEST_BEARING, 1e-6);
    // Calm cells are flagged, the true headings are not
    assert_eq!(bearing.placeholders, vec![1, 2]);

    // The tide has turned at t1
    assert_approx_eq!(sink.records[3].values[0], scenario::SOUTH_WEST_BEARING, 1e-6);
    assert_approx_eq!(sink.records[3].values[3], scenario::NORTH_EAST_BEARING, 1e-6);

    assert_eq!(sink.records[0].valid_time.offset_minutes, 0);
    assert_eq!(sink.records[2].valid_time.offset_minutes, 15);
    assert_eq!(
        sink.records[2].valid_time.valid_datetime(),
        field.times()[1]
    );

    let grid = &speed.grid;
    assert_eq!(speed.grid_type(), "regular_ll");
    assert_eq!((grid.nx, grid.ny), (2, 2));
    assert_eq!(grid.first_x, -1.5);
    assert_eq!(grid.first_y, 50.0);
    assert_approx_eq!(grid.dx, 0.027, 1e-12);
    assert_approx_eq!(grid.dy, 0.027, 1e-12);
}

#[test]
fn test_identity_resample() {
    let field = tidal_field(4, 5, 6);
    let out = resample(&field, &ResamplingSpec::identity(step("15m"))).unwrap();
    assert_eq!(out, field);
}

#[test]
fn test_spatial_stride_two() {
    let (ny, nx) = (5, 7);
    let values = create_test_grid(nx, ny);
    let field = GriddedVectorField::new(
        create_times(midnight(2025, 7, 11), 15, 1),
        create_axis(50.0, 0.027, ny),
        create_axis(-2.0, 0.027, nx),
        values.clone(),
        values,
    )
    .unwrap();

    let out = resample(&field, &spec(2, "15m")).unwrap();
    assert_eq!(out.shape(), (1, 3, 4));
    assert_eq!(
        out.longitudes(),
        &[
            field.longitudes()[0],
            field.longitudes()[2],
            field.longitudes()[4],
            field.longitudes()[6]
        ]
    );
    // Value encodes col * 1000 + row of the source cell
    assert_eq!(out.eastward()[0], 0.0);
    assert_eq!(out.eastward()[1], 2000.0);
    assert_eq!(out.eastward()[4], 2.0);
    assert_eq!(out.eastward()[11], 6004.0);
}

#[test]
fn test_temporal_stride_not_multiple() {
    let field = tidal_field(8, 3, 3);
    for bad in test_utils::time::INVALID_RESOLUTIONS {
        let err = resample(&field, &spec(1, bad)).unwrap_err();
        assert!(matches!(err, GridError::InvalidResolution(_)), "{}", bad);
    }
    for good in test_utils::time::VALID_RESOLUTIONS {
        assert!(resample(&field, &spec(1, good)).is_ok(), "{}", good);
    }
}

#[test]
fn test_invalid_resolution_reports_stage() {
    let field = tidal_field(8, 3, 3);
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();

    let err = run_pipeline(
        config(&field, spec(1, "20m")),
        &source,
        &mut sink,
    )
    .unwrap_err();

    assert_eq!(err.stage, Stage::Resample);
    assert!(matches!(err.error, GridError::InvalidResolution(_)));
    assert!(err.to_string().starts_with("resample stage failed"));
    assert!(sink.records.is_empty());
    assert!(!sink.finished);
}

#[test]
fn test_single_step_field_checks_source_cadence() {
    let field = tidal_field(1, 3, 3);
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();

    let err = run_pipeline(config(&field, spec(1, "20m")), &source, &mut sink).unwrap_err();
    assert_eq!(err.stage, Stage::Resample);
    assert!(matches!(err.error, GridError::InvalidResolution(_)));
    assert!(sink.records.is_empty());

    let mut sink = MemorySink::new();
    let summary = run_pipeline(config(&field, spec(1, "1h")), &source, &mut sink).unwrap();
    assert_eq!(summary.steps, 1);
    assert!(sink.finished);
}

#[test]
fn test_stride_two_on_two_by_two_keeps_south_west_cell() {
    let field = scenario_field();
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();

    let summary = run_pipeline(config(&field, spec(2, "15m")), &source, &mut sink).unwrap();
    assert_eq!((summary.nx, summary.ny), (1, 1));
    assert_eq!(summary.records, 4);

    let speed = &sink.records[0];
    assert_eq!(speed.values.len(), 1);
    assert_relative_eq!(speed.values[0], scenario::FAST_KNOTS, 1e-9);
    assert_eq!((speed.grid.first_x, speed.grid.first_y), (-1.5, 50.0));
    assert_approx_eq!(sink.records[1].values[0], scenario::NORTH_EAST_BEARING, 1e-6);
}

#[test]
fn test_resampling_is_lossy() {
    let field = tidal_field(8, 6, 6);
    let coarse = resample(&field, &spec(2, "30m")).unwrap();
    assert!(coarse.eastward().len() < field.eastward().len());
    assert_eq!(coarse.shape(), (4, 3, 3));

    // Nearest-neighbour upsampling back to the source grid
    let (nt, ny, nx) = field.shape();
    let mut upsampled = Vec::with_capacity(nt * ny * nx);
    for t in 0..nt {
        for j in 0..ny {
            for i in 0..nx {
                let idx = (t / 2) * 9 + (j / 2) * 3 + i / 2;
                upsampled.push(coarse.eastward()[idx]);
            }
        }
    }
    assert_ne!(upsampled.as_slice(), field.eastward());
}

#[test]
fn test_hourly_output_with_components() {
    let field = tidal_field(8, 4, 4);
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();
    let mut cfg = config(&field, spec(2, "1h"));
    cfg.include_components = true;
    cfg.reference_time = Some(field.times()[0] - Duration::hours(6));

    let summary = run_pipeline(cfg, &source, &mut sink).unwrap();
    assert_eq!(summary.steps, 2);
    assert_eq!((summary.nx, summary.ny), (2, 2));
    assert_eq!(summary.records, 8);

    let offsets: Vec<i64> = sink
        .records
        .iter()
        .map(|r| r.valid_time.offset_minutes)
        .collect();
    assert_eq!(offsets, vec![360, 360, 360, 360, 420, 420, 420, 420]);
    assert_eq!(sink.records[2].field, FieldKind::EastwardCurrent);
    assert_eq!(sink.records[3].field, FieldKind::NorthwardCurrent);
    assert_eq!(sink.records[2].units(), "m s-1");
}

#[test]
fn test_bbox_crop_through_source() {
    let field = tidal_field(2, 10, 10);
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();
    let mut cfg = config(&field, ResamplingSpec::identity(step("15m")));
    cfg.request = cfg
        .request
        .with_bbox(BoundingBox::new(-1.95, 50.05, -1.85, 50.15));

    let summary = run_pipeline(cfg, &source, &mut sink).unwrap();
    assert_eq!((summary.nx, summary.ny), (4, 4));
    assert_approx_eq!(sink.records[0].grid.first_x, -2.0 + 2.0 * 0.027, 1e-9);
}

#[test]
fn test_bearings_in_range() {
    let (u, v) = create_rotating_current(16, 16, 0.8);
    let field = GriddedVectorField::new(
        create_times(midnight(2025, 7, 11), 15, 1),
        create_axis(50.0, 0.027, 16),
        create_axis(-2.0, 0.027, 16),
        u,
        v,
    )
    .unwrap();
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();

    run_pipeline(
        config(&field, ResamplingSpec::identity(step("15m"))),
        &source,
        &mut sink,
    )
    .unwrap();

    let bearings = &sink.records[1].values;
    for (k, b) in bearings.iter().enumerate() {
        assert!((0.0..360.0).contains(b));
        assert_bearing_eq!(*b, k as f64 / 256.0 * 360.0, 1e-3);
    }
}

#[test]
fn test_output_failure_aborts_sink() {
    let field = tidal_field(4, 3, 3);
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::failing_after(3);

    let err = run_pipeline(
        config(&field, ResamplingSpec::identity(step("15m"))),
        &source,
        &mut sink,
    )
    .unwrap_err();

    assert_eq!(err.stage, Stage::Output);
    assert!(matches!(err.error, GridError::OutputFailed(_)));
    assert!(sink.aborted);
    assert!(!sink.finished);
    assert!(sink.records.is_empty());
}

#[test]
fn test_upstream_failure_is_surfaced() {
    let source = MemorySource::failing("authentication failed");
    let mut sink = MemorySink::new();
    let t0 = midnight(2025, 7, 11);
    let cfg = PipelineConfig {
        request: DatasetRequest::new("unknown_dataset", t0, t0 + Duration::days(1)),
        resampling: ResamplingSpec::identity(step("15m")),
        reference_time: None,
        include_components: false,
    };

    let err = run_pipeline(cfg, &source, &mut sink).unwrap_err();
    assert_eq!(err.stage, Stage::Source);
    assert_eq!(
        err.error,
        GridError::upstream("unknown_dataset", "authentication failed")
    );
    assert!(sink.records.is_empty());
}

#[test]
fn test_irregular_grid_rejected_before_output() {
    let t0 = midnight(2025, 7, 11);
    let field = GriddedVectorField::new(
        create_times(t0, 15, 1),
        vec![50.0, 50.1, 50.5],
        vec![0.0, 0.1],
        vec![0.1; 6],
        vec![0.1; 6],
    )
    .unwrap();
    let source = MemorySource::new(field.clone());
    let mut sink = MemorySink::new();

    let err = run_pipeline(
        config(&field, ResamplingSpec::identity(step("15m"))),
        &source,
        &mut sink,
    )
    .unwrap_err();
    assert_eq!(err.stage, Stage::Emit);
    assert!(matches!(err.error, GridError::MalformedField(_)));
}

#[test]
fn test_mismatched_components() {
    let t0 = midnight(2025, 7, 11);
    let u = ComponentGrid::new(
        product::EASTWARD_VARIABLE,
        create_times(t0, 15, 2),
        create_axis(50.0, 0.027, 2),
        create_axis(-2.0, 0.027, 2),
        vec![0.0; 8],
    );
    let mut v = u.clone();
    v.name = product::NORTHWARD_VARIABLE.to_string();
    v.values = vec![0.0; 6];

    let err = GriddedVectorField::from_components(u, v).unwrap_err();
    assert!(matches!(err, GridError::MalformedField(ref m) if m.contains("vo")));
}
