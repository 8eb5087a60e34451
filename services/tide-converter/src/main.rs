//! Tidal-current converter.
//!
//! Reads Copernicus Marine forecast files holding eastward/northward surface
//! currents and writes a GRIB2 file of current speed (knots) and bearing
//! (degrees true) for marine plotting tools:
//! - Selects the forecast files for the requested days
//! - Optionally crops to a bounding box and thins the grid
//! - Resamples to a coarser time step
//! - Writes the output atomically (`<name>.partial`, then rename)

mod config;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use current_grid::{run_pipeline, DatasetRequest, PipelineConfig, ResamplingSpec};
use grib2_writer::Grib2FileSink;
use netcdf_parser::{silence_hdf5_errors, CopernicusSource, ProductLayout};
use tide_common::{BoundingBox, TimeStep, ValidTime};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ProductConfig;

const DEFAULT_DATASET_ID: &str = "cmems_mod_nws_phy_anfc_0.027deg-2D_PT15M-i";
const DEFAULT_SOURCE_INTERVAL_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(name = "tide-converter")]
#[command(about = "Convert tidal-current forecasts to speed/bearing GRIB2")]
struct Args {
    /// Output time step (e.g. 15m, 30m, 1h, 1d); must be a multiple of the source cadence
    #[arg(short = 't', long, default_value = "15m")]
    temporal_resolution: String,

    /// Keep every Nth grid point in each direction
    #[arg(short = 's', long, default_value_t = 1)]
    spatial_resolution_factor: usize,

    /// Number of forecast days to convert, starting today
    #[arg(short = 'd', long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=10))]
    days: u32,

    /// Dataset identifier [default: cmems_mod_nws_phy_anfc_0.027deg-2D_PT15M-i]
    #[arg(short = 'i', long)]
    dataset_id: Option<String>,

    /// Directory for the GRIB2 output (and forecast files unless --input-dir is set)
    #[arg(short = 'o', long, env = "TIDE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Name of the GRIB2 output file
    #[arg(short = 'g', long, default_value = "tidal_currents.grib2")]
    grib_filename: String,

    /// Directory holding the downloaded forecast NetCDF files
    #[arg(long, env = "TIDE_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Product configuration file (YAML)
    #[arg(long, env = "TIDE_PRODUCT_CONFIG")]
    config: Option<PathBuf>,

    /// Crop to min_lon,min_lat,max_lon,max_lat
    #[arg(long, allow_hyphen_values = true)]
    bbox: Option<String>,

    /// Reference time written to every message (RFC 3339); defaults to the first output step
    #[arg(long)]
    reference_time: Option<String>,

    /// Also write eastward/northward current messages (m/s)
    #[arg(long)]
    include_components: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

/// Everything a run needs, resolved from arguments and the product file.
#[derive(Debug)]
struct RunPlan {
    pipeline: PipelineConfig,
    layout: ProductLayout,
    input_dir: PathBuf,
    output_path: PathBuf,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;
    silence_hdf5_errors();

    let product = args
        .config
        .as_deref()
        .map(ProductConfig::load)
        .transpose()?;
    if let Some(product) = &product {
        info!(
            dataset = %product.product.dataset_id,
            name = %product.product.name,
            description = %product.product.description,
            "Using product configuration"
        );
    }

    let plan = plan_run(&args, product.as_ref(), Utc::now().date_naive())?;

    info!(
        dataset = %plan.pipeline.request.dataset_id,
        input_dir = %plan.input_dir.display(),
        output = %plan.output_path.display(),
        days = args.days,
        "Starting tidal-current conversion"
    );

    let source = CopernicusSource::new(&plan.input_dir, plan.layout);
    let mut sink = Grib2FileSink::new(&plan.output_path);

    let summary = run_pipeline(plan.pipeline, &source, &mut sink)
        .with_context(|| format!("Failed to write {}", plan.output_path.display()))?;

    info!(
        summary = %serde_json::to_string(&summary)?,
        output = %plan.output_path.display(),
        "Conversion finished"
    );
    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}

fn plan_run(args: &Args, product: Option<&ProductConfig>, today: NaiveDate) -> Result<RunPlan> {
    let temporal_stride: TimeStep = args
        .temporal_resolution
        .parse()
        .with_context(|| format!("Invalid temporal resolution '{}'", args.temporal_resolution))?;

    let dataset_id = args
        .dataset_id
        .clone()
        .or_else(|| product.map(|p| p.product.dataset_id.clone()))
        .unwrap_or_else(|| DEFAULT_DATASET_ID.to_string());

    let layout = product.map(ProductConfig::layout).unwrap_or_default();

    let source_interval = match product.map(ProductConfig::source_interval).transpose()?.flatten() {
        Some(interval) => interval,
        None => TimeStep::from_minutes(DEFAULT_SOURCE_INTERVAL_MINUTES)?,
    };

    let bbox = match &args.bbox {
        Some(csv) => Some(
            BoundingBox::from_csv(csv).with_context(|| format!("Invalid bounding box '{}'", csv))?,
        ),
        None => product.and_then(ProductConfig::bbox),
    };

    let reference_time = args
        .reference_time
        .as_deref()
        .map(ValidTime::from_iso8601)
        .transpose()
        .context("Invalid reference time")?;

    let start: DateTime<Utc> = today
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid start date {}", today))?
        .and_utc();
    let end = start + Duration::days(args.days as i64);

    let mut request = DatasetRequest::new(dataset_id, start, end);
    if let Some(bbox) = bbox {
        request = request.with_bbox(bbox);
    }

    let input_dir = args
        .input_dir
        .clone()
        .unwrap_or_else(|| args.output_dir.clone());

    Ok(RunPlan {
        pipeline: PipelineConfig {
            request,
            resampling: ResamplingSpec::new(
                args.spatial_resolution_factor,
                temporal_stride,
                source_interval,
            ),
            reference_time,
            include_components: args.include_components,
        },
        layout,
        input_dir,
        output_path: args.output_dir.join(&args.grib_filename),
    })
}
