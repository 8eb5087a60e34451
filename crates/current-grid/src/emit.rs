//! Output records, one per field per time step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tide_common::{GridSpec, ValidTime};

use crate::error::{GridError, Result};
use crate::field::GriddedVectorField;
use crate::polar::PolarField;

/// Fields produced for each time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    CurrentSpeed,
    CurrentDirection,
    EastwardCurrent,
    NorthwardCurrent,
}

impl FieldKind {
    pub fn short_name(&self) -> &'static str {
        match self {
            FieldKind::CurrentSpeed => "spc",
            FieldKind::CurrentDirection => "dirc",
            FieldKind::EastwardCurrent => "ucurr",
            FieldKind::NorthwardCurrent => "vcurr",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            FieldKind::CurrentSpeed => "knots",
            FieldKind::CurrentDirection => "degrees true",
            FieldKind::EastwardCurrent | FieldKind::NorthwardCurrent => "m s-1",
        }
    }

    /// Parameter number in GRIB2 code table 4.2-10-1 (oceanographic currents).
    pub fn grib_parameter(&self) -> u8 {
        match self {
            FieldKind::CurrentDirection => 0,
            FieldKind::CurrentSpeed => 1,
            FieldKind::EastwardCurrent => 2,
            FieldKind::NorthwardCurrent => 3,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// One 2-D field at one time step, ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub field: FieldKind,
    /// Values in grid storage order (rows south to north); NaN marks missing cells
    pub values: Vec<f64>,
    /// Cells whose value is the calm-bearing placeholder rather than a heading
    pub placeholders: Vec<usize>,
    pub valid_time: ValidTime,
    pub grid: GridSpec,
    /// Index of the time step in the resampled field
    pub step_index: usize,
}

impl OutputRecord {
    pub fn grid_type(&self) -> &'static str {
        "regular_ll"
    }

    pub fn units(&self) -> &'static str {
        self.field.units()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// Builds output records for each time step of a resampled field.
#[derive(Debug, Clone)]
pub struct Emitter {
    grid: GridSpec,
    times: Vec<DateTime<Utc>>,
    reference_time: DateTime<Utc>,
    include_components: bool,
}

impl Emitter {
    /// Fails with `MalformedField` when the field is not an equally spaced grid.
    pub fn new(
        field: &GriddedVectorField,
        reference_time: DateTime<Utc>,
        include_components: bool,
    ) -> Result<Self> {
        field.check_regular()?;
        Ok(Self {
            grid: field.grid_spec()?,
            times: field.times().to_vec(),
            reference_time,
            include_components,
        })
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Records emitted per time step.
    pub fn fields(&self) -> Vec<FieldKind> {
        let mut fields = vec![FieldKind::CurrentSpeed, FieldKind::CurrentDirection];
        if self.include_components {
            fields.push(FieldKind::EastwardCurrent);
            fields.push(FieldKind::NorthwardCurrent);
        }
        fields
    }

    /// Records for one step: speed, then bearing, then u and v if enabled.
    pub fn emit_step(
        &self,
        step_index: usize,
        polar: &PolarField,
        u: &[f32],
        v: &[f32],
    ) -> Result<Vec<OutputRecord>> {
        let time = self.times.get(step_index).ok_or_else(|| {
            GridError::malformed(format!(
                "time step {} out of range ({} steps)",
                step_index,
                self.times.len()
            ))
        })?;

        if polar.len() != self.grid.len() {
            return Err(GridError::malformed(format!(
                "step {} has {} cells, grid has {}",
                step_index,
                polar.len(),
                self.grid.len()
            )));
        }

        let valid_time = ValidTime::between(self.reference_time, *time);
        if valid_time.offset_minutes < 0 {
            return Err(GridError::malformed(format!(
                "valid time {} precedes reference time {}",
                time, self.reference_time
            )));
        }

        let record = |field, values, placeholders| OutputRecord {
            field,
            values,
            placeholders,
            valid_time,
            grid: self.grid.clone(),
            step_index,
        };

        let mut records = vec![
            record(FieldKind::CurrentSpeed, polar.speeds(), Vec::new()),
            record(
                FieldKind::CurrentDirection,
                polar.bearings(),
                polar.placeholder_indices(),
            ),
        ];

        if self.include_components {
            let widen = |xs: &[f32]| xs.iter().map(|&x| x as f64).collect::<Vec<_>>();
            records.push(record(FieldKind::EastwardCurrent, widen(u), Vec::new()));
            records.push(record(FieldKind::NorthwardCurrent, widen(v), Vec::new()));
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polar::convert_step;
    use chrono::{Duration, TimeZone};

    fn field() -> GriddedVectorField {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 11, 0, 0, 0).unwrap();
        GriddedVectorField::new(
            vec![t0, t0 + Duration::hours(1)],
            vec![50.0, 50.5],
            vec![358.0, 358.5],
            vec![1.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, -1.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_record_order_and_metadata() {
        let field = field();
        let emitter = Emitter::new(&field, field.times()[0], true).unwrap();
        let (u, v) = field.step(1);
        let polar = convert_step(u, v).unwrap();
        let records = emitter.emit_step(1, &polar, u, v).unwrap();

        let kinds: Vec<FieldKind> = records.iter().map(|r| r.field).collect();
        assert_eq!(kinds, emitter.fields());
        assert_eq!(kinds[0], FieldKind::CurrentSpeed);
        assert_eq!(kinds[1], FieldKind::CurrentDirection);

        let bearing = &records[1];
        assert_eq!(bearing.grid_type(), "regular_ll");
        assert_eq!(bearing.units(), "degrees true");
        assert_eq!(bearing.valid_time.offset_minutes, 60);
        assert_eq!(bearing.placeholders, vec![1]);
        assert_eq!(bearing.grid.nx, 2);
        assert_eq!(bearing.grid.first_x, 358.0);
        assert_eq!(records[3].values, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_reference_after_valid_time() {
        let field = field();
        let emitter = Emitter::new(&field, field.times()[1], false).unwrap();
        let (u, v) = field.step(0);
        let polar = convert_step(u, v).unwrap();
        let err = emitter.emit_step(0, &polar, u, v).unwrap_err();
        assert!(matches!(err, GridError::MalformedField(_)));
    }

    #[test]
    fn test_parameter_numbers() {
        assert_eq!(FieldKind::CurrentDirection.grib_parameter(), 0);
        assert_eq!(FieldKind::CurrentSpeed.grib_parameter(), 1);
        assert_eq!(FieldKind::EastwardCurrent.grib_parameter(), 2);
        assert_eq!(FieldKind::NorthwardCurrent.grib_parameter(), 3);
    }
}
