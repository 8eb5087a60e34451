//! One GRIB2 message per output record.
//!
//! Layout of every message:
//!
//! | Section | Contents |
//! |---|---|
//! | 0 | `GRIB`, discipline 10 (oceanographic), edition 2, total length |
//! | 1 | centre, reference time, forecast data |
//! | 3 | template 3.0 regular lat/lon, origin at the south-west corner |
//! | 4 | template 4.0, category 1 (currents), forecast time, surface level |
//! | 5 | template 5.0 simple packing |
//! | 6 | bitmap when any cell is missing |
//! | 7 | packed values |
//! | 8 | `7777` |
//!
//! Section 2 (local use) is never written.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{Datelike, Timelike};
use current_grid::{FieldKind, OutputRecord};
use tide_common::GridSpec;

use crate::error::{Grib2Error, Grib2Result};
use crate::packing::{pack_simple, sign_magnitude_i16, sign_magnitude_i32, PackedField};

/// Oceanographic products (code table 0.0).
pub const DISCIPLINE_OCEANOGRAPHIC: u8 = 10;
/// Currents (code table 4.1 for discipline 10).
pub const CATEGORY_CURRENTS: u8 = 1;
/// Missing / local originating centre.
pub const CENTRE_MISSING: u16 = 255;

const SECTION1_LEN: u32 = 21;
const SECTION3_LEN: u32 = 72;
const SECTION4_LEN: u32 = 34;
const SECTION5_LEN: u32 = 21;
const MICRODEGREES: f64 = 1e6;

/// Decimal scale factor per field: knots to 0.01, degrees to 0.1, m/s to 0.001.
pub fn decimal_scale(field: FieldKind) -> i16 {
    match field {
        FieldKind::CurrentSpeed => 2,
        FieldKind::CurrentDirection => 1,
        FieldKind::EastwardCurrent | FieldKind::NorthwardCurrent => 3,
    }
}

/// Longitude in `[0, 360)` as GRIB2 requires.
pub fn normalise_longitude(lon: f64) -> f64 {
    let lon = lon.rem_euclid(360.0);
    if lon >= 360.0 {
        0.0
    } else {
        lon
    }
}

/// Forecast time as (code table 4.4 unit, value): hours when whole, else minutes.
pub fn forecast_time(offset_minutes: i64) -> Option<(u8, u32)> {
    if offset_minutes < 0 {
        return None;
    }
    if offset_minutes % 60 == 0 {
        u32::try_from(offset_minutes / 60).ok().map(|h| (1, h))
    } else {
        u32::try_from(offset_minutes).ok().map(|m| (0, m))
    }
}

/// Encodes output records into GRIB2 messages.
#[derive(Debug, Clone)]
pub struct MessageEncoder {
    centre: u16,
    sub_centre: u16,
}

impl Default for MessageEncoder {
    fn default() -> Self {
        Self {
            centre: CENTRE_MISSING,
            sub_centre: 0,
        }
    }
}

impl MessageEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_centre(mut self, centre: u16, sub_centre: u16) -> Self {
        self.centre = centre;
        self.sub_centre = sub_centre;
        self
    }

    pub fn encode(&self, record: &OutputRecord) -> Grib2Result<Bytes> {
        let grid = &record.grid;
        if record.values.len() != grid.len() {
            return Err(Grib2Error::unencodable(
                record.field,
                format!(
                    "{} values for a {}x{} grid",
                    record.values.len(),
                    grid.nx,
                    grid.ny
                ),
            ));
        }
        if grid.is_empty() {
            return Err(Grib2Error::unencodable(record.field, "empty grid"));
        }

        let packed = pack_simple(&record.values, decimal_scale(record.field))
            .map_err(|e| Grib2Error::unencodable(record.field, e.to_string()))?;

        let section1 = self.build_section1(record);
        let section3 = build_section3(record.field, grid)?;
        let section4 = build_section4(record)?;
        let section5 = build_section5(&packed);
        let section6 = build_section6(&packed);
        let section7 = build_section7(&packed);

        let message_length = 16
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4;

        let mut message = BytesMut::with_capacity(message_length);

        // Section 0: Indicator
        message.put_slice(b"GRIB");
        message.put_u16(0); // Reserved
        message.put_u8(DISCIPLINE_OCEANOGRAPHIC);
        message.put_u8(2); // Edition
        message.put_u64(message_length as u64);

        message.put_slice(&section1);
        message.put_slice(&section3);
        message.put_slice(&section4);
        message.put_slice(&section5);
        message.put_slice(&section6);
        message.put_slice(&section7);

        // Section 8: End
        message.put_slice(b"7777");

        Ok(message.freeze())
    }

    fn build_section1(&self, record: &OutputRecord) -> BytesMut {
        let mut section = BytesMut::with_capacity(SECTION1_LEN as usize);
        let reference = record.valid_time.reference_time;

        section.put_u32(SECTION1_LEN);
        section.put_u8(1);
        section.put_u16(self.centre);
        section.put_u16(self.sub_centre);
        section.put_u8(2); // Master tables version
        section.put_u8(0); // Local tables not used
        section.put_u8(1); // Significance of reference time: start of forecast

        section.put_u16(reference.year() as u16);
        section.put_u8(reference.month() as u8);
        section.put_u8(reference.day() as u8);
        section.put_u8(reference.hour() as u8);
        section.put_u8(reference.minute() as u8);
        section.put_u8(reference.second() as u8);

        section.put_u8(0); // Production status: operational
        section.put_u8(1); // Type of data: forecast
        section
    }
}

fn to_microdegrees(field: FieldKind, degrees: f64) -> Grib2Result<i32> {
    let scaled = (degrees * MICRODEGREES).round();
    if !scaled.is_finite() || scaled.abs() > i32::MAX as f64 {
        return Err(Grib2Error::unencodable(
            field,
            format!("coordinate {} out of range", degrees),
        ));
    }
    Ok(scaled as i32)
}

fn build_section3(field: FieldKind, grid: &GridSpec) -> Grib2Result<BytesMut> {
    let nx = u32::try_from(grid.nx).map_err(|_| Grib2Error::unencodable(field, "too many columns"))?;
    let ny = u32::try_from(grid.ny).map_err(|_| Grib2Error::unencodable(field, "too many rows"))?;
    let num_points = nx
        .checked_mul(ny)
        .ok_or_else(|| Grib2Error::unencodable(field, "too many grid points"))?;

    let la1 = to_microdegrees(field, grid.first_y)?;
    let lo1 = to_microdegrees(field, normalise_longitude(grid.first_x))?;
    let la2 = to_microdegrees(field, grid.last_y())?;
    let lo2 = to_microdegrees(field, normalise_longitude(grid.last_x()))?;
    let di = to_microdegrees(field, grid.dx.abs())?;
    let dj = to_microdegrees(field, grid.dy.abs())?;

    let mut section = BytesMut::with_capacity(SECTION3_LEN as usize);
    section.put_u32(SECTION3_LEN);
    section.put_u8(3);
    section.put_u8(0); // Grid defined by template
    section.put_u32(num_points);
    section.put_u8(0); // No optional list
    section.put_u8(0);
    section.put_u16(0); // Template 3.0

    section.put_u8(6); // Spherical earth, radius 6371229 m
    section.put_u8(0);
    section.put_u32(0);
    section.put_u8(0);
    section.put_u32(0);
    section.put_u8(0);
    section.put_u32(0);

    section.put_u32(nx);
    section.put_u32(ny);
    section.put_u32(0); // Basic angle
    section.put_u32(0xFFFF_FFFF); // Subdivisions of basic angle

    section.put_slice(&sign_magnitude_i32(la1));
    section.put_slice(&sign_magnitude_i32(lo1));
    section.put_u8(48); // Di and Dj given; u/v relative to easterly and northerly
    section.put_slice(&sign_magnitude_i32(la2));
    section.put_slice(&sign_magnitude_i32(lo2));
    section.put_u32(di as u32);
    section.put_u32(dj as u32);
    section.put_u8(grid.scan_mode.to_grib2_flag());
    Ok(section)
}

fn build_section4(record: &OutputRecord) -> Grib2Result<BytesMut> {
    let offset = record.valid_time.offset_minutes;
    let (unit, value) = forecast_time(offset).ok_or_else(|| {
        Grib2Error::unencodable(
            record.field,
            format!("forecast offset of {} minutes cannot be encoded", offset),
        )
    })?;

    let mut section = BytesMut::with_capacity(SECTION4_LEN as usize);
    section.put_u32(SECTION4_LEN);
    section.put_u8(4);
    section.put_u16(0); // No coordinate values
    section.put_u16(0); // Template 4.0

    section.put_u8(CATEGORY_CURRENTS);
    section.put_u8(record.field.grib_parameter());
    section.put_u8(2); // Generating process: forecast
    section.put_u8(0); // Background process
    section.put_u8(0); // Forecast process
    section.put_u16(0); // Hours of cutoff
    section.put_u8(0); // Minutes of cutoff
    section.put_u8(unit);
    section.put_u32(value);

    section.put_u8(1); // First surface: ground or water surface
    section.put_u8(0);
    section.put_u32(0);
    section.put_u8(255); // No second surface
    section.put_u8(0);
    section.put_u32(0);
    Ok(section)
}

fn build_section5(packed: &PackedField) -> BytesMut {
    let mut section = BytesMut::with_capacity(SECTION5_LEN as usize);
    section.put_u32(SECTION5_LEN);
    section.put_u8(5);
    section.put_u32(packed.num_packed);
    section.put_u16(0); // Template 5.0
    section.put_f32(packed.reference_value);
    section.put_slice(&sign_magnitude_i16(packed.binary_scale));
    section.put_slice(&sign_magnitude_i16(packed.decimal_scale));
    section.put_u8(packed.bits_per_value);
    section.put_u8(0); // Original values are floating point
    section
}

fn build_section6(packed: &PackedField) -> BytesMut {
    let bitmap = packed.bitmap.as_deref().unwrap_or_default();
    let mut section = BytesMut::with_capacity(6 + bitmap.len());
    section.put_u32(6 + bitmap.len() as u32);
    section.put_u8(6);
    if packed.bitmap.is_some() {
        section.put_u8(0); // Bitmap follows
        section.put_slice(bitmap);
    } else {
        section.put_u8(255); // No bitmap
    }
    section
}

fn build_section7(packed: &PackedField) -> BytesMut {
    let mut section = BytesMut::with_capacity(5 + packed.data.len());
    section.put_u32(5 + packed.data.len() as u32);
    section.put_u8(7);
    section.put_slice(&packed.data);
    section
}
