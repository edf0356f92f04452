//! Linear conversion from digitized samples to physical units.

use crate::error::{DecodeError, Result};
use ndarray::{Array2, Axis};

/// Affine transform `physical = gain * digital + offset` for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub gain: f64,
    pub offset: f64,
}

impl Calibration {
    /// Derives the transform from a channel's declared extrema.
    ///
    /// The extrema are used literally: no ordering between min and max is
    /// assumed, only that the digital range is non-empty.
    pub fn from_extrema(
        channel_id: u16,
        digital_min: i16,
        digital_max: i16,
        analog_min: i16,
        analog_max: i16,
    ) -> Result<Self> {
        if digital_max == digital_min {
            return Err(DecodeError::DegenerateCalibration {
                channel_id,
                digital: digital_max,
            });
        }
        let gain = (f64::from(analog_max) - f64::from(analog_min))
            / (f64::from(digital_max) - f64::from(digital_min));
        let offset = f64::from(analog_max) - gain * f64::from(digital_max);
        Ok(Self { gain, offset })
    }

    #[inline]
    pub fn apply(&self, digital: i16) -> f64 {
        self.gain * f64::from(digital) + self.offset
    }
}

/// Converts a time-by-channel matrix of raw samples into physical units.
///
/// Column `c` is transformed with `calibrations[c]`. The raw matrix is left
/// untouched and a new buffer is returned.
pub fn calibrate(raw: &Array2<i16>, calibrations: &[Calibration]) -> Array2<f64> {
    debug_assert_eq!(raw.ncols(), calibrations.len());
    let mut physical = raw.mapv(f64::from);
    for (mut column, cal) in physical.axis_iter_mut(Axis(1)).zip(calibrations) {
        column.mapv_inplace(|v| cal.gain * v + cal.offset);
    }
    physical
}
