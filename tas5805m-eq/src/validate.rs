//! Parameter checks run before any chip I/O.
//!
//! Each check logs the specific reason for a rejection and returns
//! [`Error::InvalidParameter`].

use core::ops::RangeInclusive;

use crate::biquad::BiquadCoefficients;
use crate::error::{Error, Parameter, Result};

/// Accepted ranges for filter design parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationLimits {
    /// Centre/corner frequency in Hz.
    pub frequency: RangeInclusive<f32>,
    /// Gain in dB.
    pub gain_db: RangeInclusive<f32>,
    pub q: RangeInclusive<f32>,
    /// Shelf slope.
    pub slope: RangeInclusive<f32>,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            frequency: 10.0..=24_000.0,
            gain_db: -20.0..=20.0,
            q: 0.1..=20.0,
            slope: 0.1..=5.0,
        }
    }
}

impl ValidationLimits {
    pub fn check_frequency(&self, hz: f32) -> Result<()> {
        check_range(hz, &self.frequency, Parameter::Frequency)
    }

    pub fn check_gain(&self, db: f32) -> Result<()> {
        check_range(db, &self.gain_db, Parameter::Gain)
    }

    pub fn check_q(&self, q: f32) -> Result<()> {
        check_range(q, &self.q, Parameter::Q)
    }

    pub fn check_slope(&self, slope: f32) -> Result<()> {
        check_range(slope, &self.slope, Parameter::Slope)
    }
}

/// Reject non-finite values and values outside `range`.
pub fn check_range(value: f32, range: &RangeInclusive<f32>, what: Parameter) -> Result<()> {
    if !value.is_finite() || !range.contains(&value) {
        log::error!(
            "Invalid {}: {} (must be {} to {})",
            what,
            value,
            range.start(),
            range.end()
        );
        return Err(Error::InvalidParameter(what));
    }
    Ok(())
}

/// Reject coefficient sets containing NaN or infinity.
pub fn check_coefficients(coeffs: &BiquadCoefficients) -> Result<()> {
    if !coeffs.is_finite() {
        log::error!("Coefficient contains NaN or Inf: {:?}", coeffs);
        return Err(Error::InvalidParameter(Parameter::Coefficient));
    }
    Ok(())
}

/// Reject sample rates that are not finite and positive.
pub fn check_sample_rate(fs: f32) -> Result<()> {
    if !fs.is_finite() || fs <= 0.0 {
        log::error!("Invalid sample rate: {}", fs);
        return Err(Error::InvalidParameter(Parameter::SampleRate));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_limits() {
        let limits = ValidationLimits::default();
        assert!(limits.check_frequency(10.0).is_ok());
        assert!(limits.check_frequency(1000.0).is_ok());
        assert!(limits.check_frequency(24_000.0).is_ok());
        assert_eq!(
            limits.check_frequency(5.0),
            Err(Error::InvalidParameter(Parameter::Frequency))
        );
        assert!(limits.check_frequency(25_000.0).is_err());
        assert!(limits.check_frequency(f32::NAN).is_err());
        assert!(limits.check_frequency(f32::INFINITY).is_err());
    }

    #[test]
    fn gain_limits() {
        let limits = ValidationLimits::default();
        assert!(limits.check_gain(-20.0).is_ok());
        assert!(limits.check_gain(0.0).is_ok());
        assert!(limits.check_gain(20.0).is_ok());
        assert!(limits.check_gain(-25.0).is_err());
        assert!(limits.check_gain(25.0).is_err());
        assert!(limits.check_gain(f32::NAN).is_err());
    }

    #[test]
    fn q_limits() {
        let limits = ValidationLimits::default();
        assert!(limits.check_q(0.1).is_ok());
        assert!(limits.check_q(0.707).is_ok());
        assert!(limits.check_q(20.0).is_ok());
        assert!(limits.check_q(0.05).is_err());
        assert!(limits.check_q(25.0).is_err());
        assert!(limits.check_q(f32::NEG_INFINITY).is_err());
    }

    #[test]
    fn slope_limits() {
        let limits = ValidationLimits::default();
        assert!(limits.check_slope(0.1).is_ok());
        assert!(limits.check_slope(1.0).is_ok());
        assert!(limits.check_slope(5.0).is_ok());
        assert!(limits.check_slope(0.05).is_err());
        assert!(limits.check_slope(6.0).is_err());
    }

    #[test]
    fn custom_limits() {
        let limits = ValidationLimits {
            frequency: 20.0..=20_000.0,
            ..ValidationLimits::default()
        };
        assert!(limits.check_frequency(15.0).is_err());
        assert!(limits.check_frequency(20.0).is_ok());
    }

    #[test]
    fn coefficients_must_be_finite() {
        assert!(check_coefficients(&BiquadCoefficients::new(1.0, 0.5, 0.25, -0.5, 0.1)).is_ok());
        assert_eq!(
            check_coefficients(&BiquadCoefficients::new(f32::NAN, 0.0, 0.0, 0.0, 0.0)),
            Err(Error::InvalidParameter(Parameter::Coefficient))
        );
        assert!(check_coefficients(&BiquadCoefficients::new(1.0, 0.0, 0.0, f32::INFINITY, 0.0)).is_err());
    }

    #[test]
    fn sample_rate() {
        assert!(check_sample_rate(48_000.0).is_ok());
        assert!(check_sample_rate(0.0).is_err());
        assert!(check_sample_rate(f32::NAN).is_err());
    }
}
