//! Simple packing (data representation template 5.0) and bitmaps.
//!
//! Unpacked value: `Y = (R + X * 2^E) / 10^D`, where `R` is the reference
//! value, `X` the packed integer, `E` the binary and `D` the decimal scale
//! factor. Missing cells are flagged in the bitmap and take no space in the
//! packed data.

use crate::error::{Grib2Error, Grib2Result};

/// Bits per packed value when a field is not constant.
pub const BITS_PER_VALUE: u8 = 16;

const MAX_PACKED: f64 = 65535.0;

/// Section 5 and 7 contents for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedField {
    pub reference_value: f32,
    pub binary_scale: i16,
    pub decimal_scale: i16,
    /// 0 for constant (or fully missing) fields
    pub bits_per_value: u8,
    /// Cells written to the data section (non-missing cells)
    pub num_packed: u32,
    /// One bit per cell, MSB first; `None` when every cell has data
    pub bitmap: Option<Vec<u8>>,
    pub data: Vec<u8>,
}

/// Pack `values` with the given decimal scale; NaN cells go into the bitmap.
pub fn pack_simple(values: &[f64], decimal_scale: i16) -> Grib2Result<PackedField> {
    let factor = 10f64.powi(decimal_scale as i32);
    let present: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| v * factor)
        .collect();

    if present.iter().any(|v| v.is_infinite()) {
        return Err(Grib2Error::InvalidFormat(
            "cannot pack infinite values".to_string(),
        ));
    }

    let bitmap = if present.len() < values.len() {
        Some(build_bitmap(values))
    } else {
        None
    };

    let (min, max) = present
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if present.is_empty() || max == min {
        return Ok(PackedField {
            reference_value: if present.is_empty() { 0.0 } else { min as f32 },
            binary_scale: 0,
            decimal_scale,
            bits_per_value: 0,
            num_packed: present.len() as u32,
            bitmap,
            data: Vec::new(),
        });
    }

    let reference_value = min as f32;
    let range = max - reference_value as f64;
    // Precision comes from the decimal scale; E only grows when the scaled range overflows 16 bits
    let binary_scale: i16 = if range > MAX_PACKED {
        (range / MAX_PACKED).log2().ceil() as i16
    } else {
        0
    };
    let step = 2f64.powi(binary_scale as i32);

    let mut data = Vec::with_capacity(present.len() * 2);
    for v in &present {
        let packed = ((v - reference_value as f64) / step).round().clamp(0.0, MAX_PACKED) as u16;
        data.extend_from_slice(&packed.to_be_bytes());
    }

    Ok(PackedField {
        reference_value,
        binary_scale,
        decimal_scale,
        bits_per_value: BITS_PER_VALUE,
        num_packed: present.len() as u32,
        bitmap,
        data,
    })
}

fn build_bitmap(values: &[f64]) -> Vec<u8> {
    let mut bitmap = vec![0u8; values.len().div_ceil(8)];
    for (i, v) in values.iter().enumerate() {
        if !v.is_nan() {
            bitmap[i / 8] |= 0x80 >> (i % 8);
        }
    }
    bitmap
}

/// GRIB2 signed integers are sign and magnitude, not two's complement.
pub fn sign_magnitude_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

pub fn sign_magnitude_i32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 {
        magnitude | 0x8000_0000
    } else {
        magnitude
    };
    raw.to_be_bytes()
}
