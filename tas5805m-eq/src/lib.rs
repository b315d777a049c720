//! # tas5805m-eq
//!
//! A `no_std`, allocation-free driver for the equalizer of the
//! [TAS5805M](https://www.ti.com/product/TAS5805M) class-D amplifier. It turns
//! filter parameters (frequency, gain, Q) into 9.23 fixed-point biquad
//! coefficients, programs them into the chip's paged coefficient memory over
//! I2C, and keeps named calibration profiles in a key/value store so one can
//! be re-applied at boot.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Types | [`biquad`] / [`error`] | Coefficient sets, channel addressing, error type |
//! | Math | [`dsp`] | Audio EQ Cookbook filter designs (feature-gated) |
//! | Encoding | [`fixed`] / [`validate`] | 9.23 fixed point, parameter checks |
//! | Driver | [`codec`] | Retrying I2C writes, book/page protocol, biquad programming (feature-gated) |
//! | Storage | [`profile`] | Profile record format, slot store, apply-on-boot (feature-gated) |
//!
//! ## Quick start
//!
//! ```ignore
//! use tas5805m_eq::prelude::*;
//!
//! let mut amp = Tas5805m::new(i2c, delay);
//!
//! // 80 Hz high-pass and a 3 dB cut at 250 Hz on both channels
//! amp.write_highpass(Channel::Both, 0, 80.0, 0.707, 48_000.0)?;
//! amp.write_parametric_eq(Channel::Both, 1, 250.0, -3.0, 1.4, 48_000.0)?;
//!
//! // Persist what was just written and make it the boot profile
//! let mut store = ProfileStore::new(flash, clock);
//! store.save("living room", &amp.current_profile())?;
//! store.set_active("living room")?;
//!
//! // Next boot:
//! store.apply_active(&mut amp)?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `dsp` | yes | Filter design functions and the design-and-write helpers |
//! | `tas5805m` | yes | Register driver and profile store (requires `embedded-hal`) |
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade: `error!` for rejected
//! parameters and exhausted retries, `warn!` per failed bus attempt, `info!`
//! for completed operations and `debug!` for coefficient dumps. Install any
//! logger, or none.

#![cfg_attr(not(test), no_std)]

pub mod constants;
pub mod error;
pub mod biquad;
pub mod fixed;
pub mod validate;

#[cfg(feature = "dsp")]
pub mod dsp;

#[cfg(feature = "tas5805m")]
pub mod codec;

#[cfg(feature = "tas5805m")]
pub mod profile;

#[cfg(all(test, feature = "tas5805m"))]
mod testing;

pub use biquad::{BiquadCoefficients, Channel, Side};
pub use error::{BusFault, Error, Parameter, Result};

/// Common imports.
pub mod prelude {
    pub use crate::biquad::{BiquadCoefficients, Channel, Side};
    pub use crate::error::{Error, Result};
    pub use crate::validate::ValidationLimits;

    #[cfg(feature = "dsp")]
    pub use crate::dsp::FilterSpec;

    #[cfg(feature = "tas5805m")]
    pub use crate::codec::{DriverConfig, RetryPolicy, Tas5805m};

    #[cfg(feature = "tas5805m")]
    pub use crate::profile::{
        ActiveProfile, CalibrationProfile, Clock, Preferences, ProfileStore, StoreConfig,
    };
}
