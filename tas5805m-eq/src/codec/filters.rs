//! Design-and-write helpers: compute a cookbook filter and program it into a
//! biquad slot in one call.
//!
//! Parameters are checked against [`ValidationLimits`] before any I/O. Each
//! helper returns the coefficients it computed so callers can record them in
//! a profile.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::tas5805m::Tas5805m;
use crate::biquad::{check_index, BiquadCoefficients, Channel};
use crate::dsp::FilterSpec;
use crate::error::Result;
use crate::validate::ValidationLimits;

impl<I2C, D> Tas5805m<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Validate `filter` against the default limits, design it at `fs` and
    /// write it to `index` of `channel`.
    pub fn write_filter(
        &mut self,
        channel: Channel,
        index: usize,
        filter: &FilterSpec,
        fs: f32,
    ) -> Result<BiquadCoefficients> {
        self.write_filter_with_limits(channel, index, filter, fs, &ValidationLimits::default())
    }

    /// [`write_filter`](Self::write_filter) with caller-supplied limits.
    pub fn write_filter_with_limits(
        &mut self,
        channel: Channel,
        index: usize,
        filter: &FilterSpec,
        fs: f32,
        limits: &ValidationLimits,
    ) -> Result<BiquadCoefficients> {
        check_index(index)?;
        filter.validate(limits, fs)?;

        let coeffs = filter.design(fs);
        log::info!("{}: {:?} -> {:?}[{}]", filter.kind(), filter, channel, index);
        self.write_biquad(channel, index, &coeffs)?;
        Ok(coeffs)
    }

    /// Peaking EQ boosting or cutting `gain_db` around `frequency`.
    pub fn write_parametric_eq(
        &mut self,
        channel: Channel,
        index: usize,
        frequency: f32,
        gain_db: f32,
        q: f32,
        fs: f32,
    ) -> Result<BiquadCoefficients> {
        self.write_filter(channel, index, &FilterSpec::Peaking { frequency, gain_db, q }, fs)
    }

    /// Low shelf with `gain_db` below `frequency`; `slope` 1.0 is the steepest
    /// monotonic shelf.
    pub fn write_low_shelf(
        &mut self,
        channel: Channel,
        index: usize,
        frequency: f32,
        gain_db: f32,
        slope: f32,
        fs: f32,
    ) -> Result<BiquadCoefficients> {
        self.write_filter(channel, index, &FilterSpec::LowShelf { frequency, gain_db, slope }, fs)
    }

    /// High shelf with `gain_db` above `frequency`.
    pub fn write_high_shelf(
        &mut self,
        channel: Channel,
        index: usize,
        frequency: f32,
        gain_db: f32,
        slope: f32,
        fs: f32,
    ) -> Result<BiquadCoefficients> {
        self.write_filter(channel, index, &FilterSpec::HighShelf { frequency, gain_db, slope }, fs)
    }

    /// Second-order high-pass at `frequency`.
    pub fn write_highpass(
        &mut self,
        channel: Channel,
        index: usize,
        frequency: f32,
        q: f32,
        fs: f32,
    ) -> Result<BiquadCoefficients> {
        self.write_filter(channel, index, &FilterSpec::HighPass { frequency, q }, fs)
    }

    /// Second-order low-pass at `frequency`.
    pub fn write_lowpass(
        &mut self,
        channel: Channel,
        index: usize,
        frequency: f32,
        q: f32,
        fs: f32,
    ) -> Result<BiquadCoefficients> {
        self.write_filter(channel, index, &FilterSpec::LowPass { frequency, q }, fs)
    }

    /// Notch centred on `frequency` with width set by `q`.
    pub fn write_notch(
        &mut self,
        channel: Channel,
        index: usize,
        frequency: f32,
        q: f32,
        fs: f32,
    ) -> Result<BiquadCoefficients> {
        self.write_filter(channel, index, &FilterSpec::Notch { frequency, q }, fs)
    }
}
