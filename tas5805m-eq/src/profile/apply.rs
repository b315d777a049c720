//! Moving whole profiles between the driver and [`CalibrationProfile`].

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::record::CalibrationProfile;
use crate::biquad::Side;
use crate::codec::Tas5805m;
use crate::error::Result;

impl<I2C, D> Tas5805m<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Snapshot of the coefficients last written to each slot, as an
    /// unnamed profile ready to be saved.
    pub fn current_profile(&self) -> CalibrationProfile {
        let mut profile = CalibrationProfile {
            left: *self.shadow(Side::Left),
            right: *self.shadow(Side::Right),
            ..CalibrationProfile::default()
        };
        profile.num_filters_used = profile.count_active_filters();
        profile
    }

    /// Write every filter of `profile` using the batched page path.
    ///
    /// The right side is attempted even if the left one failed.
    pub fn apply_profile_batched(&mut self, profile: &CalibrationProfile) -> Result<()> {
        log::info!("Applying profile '{}' (batched)", profile.name);
        self.write_all_biquads_batched(&profile.left, &profile.right)
    }
}
