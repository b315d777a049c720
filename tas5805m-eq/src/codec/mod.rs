//! TAS5805M amplifier driver module.
//!
//! [`Tas5805m`] owns the bus and delay provider and provides retrying
//! register writes, book/page navigation and biquad programming, both per
//! slot and batched per page. With the `dsp` feature it also designs and
//! writes cookbook filters in one call.
//!
//! # Feature gate
//!
//! This module is available when the `tas5805m` feature is enabled (on by default).

pub mod registers;
mod biquad;
#[cfg(feature = "dsp")]
mod filters;
mod tas5805m;

pub use biquad::encode_record;
pub use tas5805m::{CoefficientSession, DriverConfig, RetryPolicy, Tas5805m, MAX_WRITE_LEN};
