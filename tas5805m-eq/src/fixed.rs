//! 9.23 fixed-point conversion and big-endian packing.
//!
//! The TAS5805M stores every coefficient as a signed 32-bit word with 9
//! integer bits and 23 fractional bits, most significant byte first.

/// 1.0 in 9.23 format.
pub const ONE_9_23: i32 = 1 << 23;

/// Largest input accepted before clamping.
pub const MAX_9_23: f32 = 255.999_999;

/// Smallest input accepted before clamping.
pub const MIN_9_23: f32 = -256.0;

/// Convert `value` to 9.23 fixed point, truncating toward zero.
///
/// Out-of-range values are clamped to `[-256.0, 255.999999]`. NaN and
/// infinities encode as 0 so a bad coefficient never reaches the audio path
/// as garbage.
pub fn encode_9_23(value: f32) -> i32 {
    if !value.is_finite() {
        log::error!("Invalid coefficient: {} (NaN or Inf), using 0", value);
        return 0;
    }
    let clamped = value.clamp(MIN_9_23, MAX_9_23);
    // `as` saturates, which covers 255.999999 rounding up to 256.0 in f32.
    (clamped * ONE_9_23 as f32) as i32
}

/// Convert a 9.23 word back to a float.
pub fn decode_9_23(raw: i32) -> f32 {
    raw as f32 / ONE_9_23 as f32
}

/// Serialize `value` most significant byte first.
#[inline]
pub fn pack_be32(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Inverse of [`pack_be32`].
#[inline]
pub fn unpack_be32(bytes: [u8; 4]) -> i32 {
    i32::from_be_bytes(bytes)
}
