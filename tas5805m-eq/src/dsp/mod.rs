//! Filter design.
//!
//! Pure functions turning frequency/gain/Q/slope into normalized
//! [`BiquadCoefficients`](crate::biquad::BiquadCoefficients).
//!
//! # Feature gate
//!
//! This module is available when the `dsp` feature is enabled (on by default).

mod design;

pub use design::{high_shelf, highpass, low_shelf, lowpass, notch, parametric_eq, FilterSpec};
