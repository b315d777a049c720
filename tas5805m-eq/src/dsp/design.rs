//! Biquad designs from the Audio EQ Cookbook (R. Bristow-Johnson).
//!
//! Every designer returns coefficients normalized so that `a0 == 1`. The
//! math does not guard against degenerate input (Q → 0, frequency at or
//! above Nyquist); run [`FilterSpec::validate`] or the checks in
//! [`crate::validate`] first.

use core::f32::consts::PI;

use libm::{cosf, powf, sinf, sqrtf};

use crate::biquad::BiquadCoefficients;
use crate::error::Result;
use crate::validate::{check_sample_rate, ValidationLimits};

/// Shared intermediate terms: `(cos ω, sin ω)` for `ω = 2π·f/fs`.
fn omega(frequency: f32, fs: f32) -> (f32, f32) {
    let w = 2.0 * PI * frequency / fs;
    (cosf(w), sinf(w))
}

fn normalize(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> BiquadCoefficients {
    BiquadCoefficients::new(b0 / a0, b1 / a0, b2 / a0, a1 / a0, a2 / a0)
}

/// Peaking EQ: boost or cut `gain_db` around `frequency`, bandwidth set by `q`.
pub fn parametric_eq(frequency: f32, gain_db: f32, q: f32, fs: f32) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_w, sin_w) = omega(frequency, fs);
    let alpha = sin_w / (2.0 * q);

    normalize(
        1.0 + alpha * a,
        -2.0 * cos_w,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_w,
        1.0 - alpha / a,
    )
}

/// Shelf alpha term: `sin ω / 2 · sqrt((A + 1/A)(1/S - 1) + 2)`.
fn shelf_alpha(a: f32, sin_w: f32, slope: f32) -> f32 {
    sin_w / 2.0 * sqrtf((a + 1.0 / a) * (1.0 / slope - 1.0) + 2.0)
}

/// Low shelf: `gain_db` applied below `frequency`; `slope` = 1 is the steepest monotonic shelf.
pub fn low_shelf(frequency: f32, gain_db: f32, slope: f32, fs: f32) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_w, sin_w) = omega(frequency, fs);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * shelf_alpha(a, sin_w, slope);

    normalize(
        a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
        2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
        a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
        (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
        -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
        (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
    )
}

/// High shelf: `gain_db` applied above `frequency`.
pub fn high_shelf(frequency: f32, gain_db: f32, slope: f32, fs: f32) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_w, sin_w) = omega(frequency, fs);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * shelf_alpha(a, sin_w, slope);

    normalize(
        a * ((a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha),
        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
        a * ((a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha),
        (a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha,
        2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
        (a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha,
    )
}

/// Second-order high-pass. `q` = 0.707 gives a Butterworth response.
pub fn highpass(frequency: f32, q: f32, fs: f32) -> BiquadCoefficients {
    let (cos_w, sin_w) = omega(frequency, fs);
    let alpha = sin_w / (2.0 * q);

    normalize(
        (1.0 + cos_w) / 2.0,
        -(1.0 + cos_w),
        (1.0 + cos_w) / 2.0,
        1.0 + alpha,
        -2.0 * cos_w,
        1.0 - alpha,
    )
}

/// Second-order low-pass. `q` = 0.707 gives a Butterworth response.
pub fn lowpass(frequency: f32, q: f32, fs: f32) -> BiquadCoefficients {
    let (cos_w, sin_w) = omega(frequency, fs);
    let alpha = sin_w / (2.0 * q);

    normalize(
        (1.0 - cos_w) / 2.0,
        1.0 - cos_w,
        (1.0 - cos_w) / 2.0,
        1.0 + alpha,
        -2.0 * cos_w,
        1.0 - alpha,
    )
}

/// Unity-gain band-reject centred on `frequency`.
pub fn notch(frequency: f32, q: f32, fs: f32) -> BiquadCoefficients {
    let (cos_w, sin_w) = omega(frequency, fs);
    let alpha = sin_w / (2.0 * q);

    normalize(
        1.0,
        -2.0 * cos_w,
        1.0,
        1.0 + alpha,
        -2.0 * cos_w,
        1.0 - alpha,
    )
}

/// A filter described by its musical parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpec {
    Peaking { frequency: f32, gain_db: f32, q: f32 },
    LowShelf { frequency: f32, gain_db: f32, slope: f32 },
    HighShelf { frequency: f32, gain_db: f32, slope: f32 },
    HighPass { frequency: f32, q: f32 },
    LowPass { frequency: f32, q: f32 },
    Notch { frequency: f32, q: f32 },
}

impl FilterSpec {
    /// Compute normalized coefficients at sample rate `fs`.
    pub fn design(&self, fs: f32) -> BiquadCoefficients {
        match *self {
            FilterSpec::Peaking { frequency, gain_db, q } => parametric_eq(frequency, gain_db, q, fs),
            FilterSpec::LowShelf { frequency, gain_db, slope } => low_shelf(frequency, gain_db, slope, fs),
            FilterSpec::HighShelf { frequency, gain_db, slope } => high_shelf(frequency, gain_db, slope, fs),
            FilterSpec::HighPass { frequency, q } => highpass(frequency, q, fs),
            FilterSpec::LowPass { frequency, q } => lowpass(frequency, q, fs),
            FilterSpec::Notch { frequency, q } => notch(frequency, q, fs),
        }
    }

    /// Check every parameter of this filter against `limits`.
    pub fn validate(&self, limits: &ValidationLimits, fs: f32) -> Result<()> {
        check_sample_rate(fs)?;
        match *self {
            FilterSpec::Peaking { frequency, gain_db, q } => {
                limits.check_frequency(frequency)?;
                limits.check_gain(gain_db)?;
                limits.check_q(q)
            }
            FilterSpec::LowShelf { frequency, gain_db, slope }
            | FilterSpec::HighShelf { frequency, gain_db, slope } => {
                limits.check_frequency(frequency)?;
                limits.check_gain(gain_db)?;
                limits.check_slope(slope)
            }
            FilterSpec::HighPass { frequency, q }
            | FilterSpec::LowPass { frequency, q }
            | FilterSpec::Notch { frequency, q } => {
                limits.check_frequency(frequency)?;
                limits.check_q(q)
            }
        }
    }

    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            FilterSpec::Peaking { .. } => "PEQ",
            FilterSpec::LowShelf { .. } => "low shelf",
            FilterSpec::HighShelf { .. } => "high shelf",
            FilterSpec::HighPass { .. } => "high-pass",
            FilterSpec::LowPass { .. } => "low-pass",
            FilterSpec::Notch { .. } => "notch",
        }
    }
}
