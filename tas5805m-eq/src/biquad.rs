//! Biquad coefficient sets and the channel/slot addressing shared by every layer.

use libm::fabsf;

use crate::constants::{BIQUADS_PER_CHANNEL, BYPASS_TOLERANCE};
use crate::error::{Error, Parameter, Result};

/// Normalized biquad coefficients (`a0` is implicitly 1).
///
/// `a1`/`a2` follow the textbook sign convention
/// `y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] - a1·y[n-1] - a2·y[n-2]`.
/// The driver negates them on the way to the chip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Identity filter: passes audio through unchanged.
    pub const BYPASS: Self = Self::new(1.0, 0.0, 0.0, 0.0, 0.0);

    pub const fn new(b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// `true` when every coefficient is within [`BYPASS_TOLERANCE`] of the identity filter.
    pub fn is_bypass(&self) -> bool {
        fabsf(self.b0 - 1.0) < BYPASS_TOLERANCE
            && fabsf(self.b1) < BYPASS_TOLERANCE
            && fabsf(self.b2) < BYPASS_TOLERANCE
            && fabsf(self.a1) < BYPASS_TOLERANCE
            && fabsf(self.a2) < BYPASS_TOLERANCE
    }

    /// `true` when no coefficient is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|c| c.is_finite())
    }

    /// Coefficients in wire order `[b0, b1, b2, a1, a2]`.
    pub fn as_array(&self) -> [f32; 5] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    pub fn from_array(c: [f32; 5]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4])
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::BYPASS
    }
}

/// Stereo channel selection for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
    /// Same coefficients written to both channels.
    Both,
}

impl Channel {
    /// Whether this selection includes `side`.
    pub fn includes(self, side: Side) -> bool {
        matches!(
            (self, side),
            (Channel::Both, _) | (Channel::Left, Side::Left) | (Channel::Right, Side::Right)
        )
    }

    /// The sides covered by this selection, left first.
    pub fn sides(self) -> impl Iterator<Item = Side> {
        [Side::Left, Side::Right]
            .into_iter()
            .filter(move |&side| self.includes(side))
    }
}

/// Numeric channel codes: 0 = left, 1 = right, 2 = both.
impl TryFrom<i32> for Channel {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Channel::Left),
            1 => Ok(Channel::Right),
            2 => Ok(Channel::Both),
            _ => {
                log::error!("Invalid channel: {} (must be 0-2)", code);
                Err(Error::InvalidParameter(Parameter::Channel))
            }
        }
    }
}

impl From<Side> for Channel {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Channel::Left,
            Side::Right => Channel::Right,
        }
    }
}

/// One physical channel of the stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl TryFrom<Channel> for Side {
    type Error = Error;

    /// Fails for [`Channel::Both`].
    fn try_from(channel: Channel) -> Result<Self> {
        match channel {
            Channel::Left => Ok(Side::Left),
            Channel::Right => Ok(Side::Right),
            Channel::Both => Err(Error::InvalidParameter(Parameter::Channel)),
        }
    }
}

/// Check that `index` names one of the 15 biquad slots of a channel.
pub fn check_index(index: usize) -> Result<usize> {
    if index >= BIQUADS_PER_CHANNEL {
        log::error!(
            "Invalid biquad index: {} (must be 0-{})",
            index,
            BIQUADS_PER_CHANNEL - 1
        );
        return Err(Error::InvalidParameter(Parameter::Index));
    }
    Ok(index)
}

/// Signed variant of [`check_index`] for indices that arrive as plain integers.
pub fn index_from_i32(index: i32) -> Result<usize> {
    match usize::try_from(index) {
        Ok(i) => check_index(i),
        Err(_) => {
            log::error!(
                "Invalid biquad index: {} (must be 0-{})",
                index,
                BIQUADS_PER_CHANNEL - 1
            );
            Err(Error::InvalidParameter(Parameter::Index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_bypass() {
        assert!(BiquadCoefficients::default().is_bypass());
        assert_eq!(BiquadCoefficients::default(), BiquadCoefficients::BYPASS);
    }

    #[test]
    fn bypass_uses_tolerance() {
        assert!(BiquadCoefficients::new(1.00005, 0.00001, 0.0, 0.0, 0.0).is_bypass());
        assert!(!BiquadCoefficients::new(1.0, 0.0, 0.0, 0.0002, 0.0).is_bypass());
        assert!(!BiquadCoefficients::new(1.5, -2.0, 0.5, -1.9, 0.95).is_bypass());
    }

    #[test]
    fn finite_check() {
        assert!(BiquadCoefficients::BYPASS.is_finite());
        assert!(!BiquadCoefficients::new(f32::NAN, 0.0, 0.0, 0.0, 0.0).is_finite());
        assert!(!BiquadCoefficients::new(1.0, 0.0, 0.0, 0.0, f32::INFINITY).is_finite());
    }

    #[test]
    fn channel_codes() {
        assert_eq!(Channel::try_from(0i32), Ok(Channel::Left));
        assert_eq!(Channel::try_from(1i32), Ok(Channel::Right));
        assert_eq!(Channel::try_from(2i32), Ok(Channel::Both));
        assert_eq!(
            Channel::try_from(-1i32),
            Err(Error::InvalidParameter(Parameter::Channel))
        );
        assert!(Channel::try_from(3i32).is_err());
    }

    #[test]
    fn channel_sides() {
        let both: heapless::Vec<Side, 2> = Channel::Both.sides().collect();
        assert_eq!(both.as_slice(), &[Side::Left, Side::Right]);
        let right: heapless::Vec<Side, 2> = Channel::Right.sides().collect();
        assert_eq!(right.as_slice(), &[Side::Right]);
        assert!(Side::try_from(Channel::Both).is_err());
    }

    #[test]
    fn index_range() {
        assert_eq!(check_index(0), Ok(0));
        assert_eq!(check_index(14), Ok(14));
        assert!(check_index(15).is_err());
        assert!(index_from_i32(-1).is_err());
        assert_eq!(index_from_i32(7), Ok(7));
    }
}
