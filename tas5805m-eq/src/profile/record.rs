//! Calibration profile and its fixed-layout persisted image.
//!
//! The image is packed little-endian with no padding:
//!
//! | Offset | Len | Field |
//! |-------:|----:|-------|
//! | 0      | 4   | magic (`0x54415335`) |
//! | 4      | 32  | name, NUL-padded |
//! | 36     | 4   | timestamp (s) |
//! | 40     | 300 | left channel, 15 × `[b0, b1, b2, a1, a2]` f32 |
//! | 340    | 300 | right channel |
//! | 640    | 1   | active filter count |
//! | 641    | 4   | CRC-32 of bytes 0..641 |

use heapless::String;

use crate::biquad::{check_index, BiquadCoefficients, Channel, Side};
use crate::constants::{BIQUADS_PER_CHANNEL, MAX_PROFILE_NAME_LEN, PROFILE_MAGIC};
use crate::error::{Error, Result};

/// Longest profile name in bytes (the stored field keeps one NUL).
pub const NAME_CAPACITY: usize = MAX_PROFILE_NAME_LEN - 1;

/// Bounded profile name.
pub type ProfileName = String<NAME_CAPACITY>;

const CHANNEL_LEN: usize = BIQUADS_PER_CHANNEL * 5 * 4;

const MAGIC_AT: usize = 0;
const NAME_AT: usize = MAGIC_AT + 4;
const TIMESTAMP_AT: usize = NAME_AT + MAX_PROFILE_NAME_LEN;
const LEFT_AT: usize = TIMESTAMP_AT + 4;
const RIGHT_AT: usize = LEFT_AT + CHANNEL_LEN;
const COUNT_AT: usize = RIGHT_AT + CHANNEL_LEN;
const CHECKSUM_AT: usize = COUNT_AT + 1;

/// Size of a persisted profile image in bytes.
pub const RECORD_LEN: usize = CHECKSUM_AT + 4;

/// Thirty filters (15 per side) plus name and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationProfile {
    pub name: ProfileName,
    /// Seconds, as reported by the store's clock when saved.
    pub timestamp: u32,
    pub left: [BiquadCoefficients; BIQUADS_PER_CHANNEL],
    pub right: [BiquadCoefficients; BIQUADS_PER_CHANNEL],
    /// Indices where either side is not bypass. Recomputed on every encode.
    pub num_filters_used: u8,
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self {
            name: ProfileName::new(),
            timestamp: 0,
            left: [BiquadCoefficients::BYPASS; BIQUADS_PER_CHANNEL],
            right: [BiquadCoefficients::BYPASS; BIQUADS_PER_CHANNEL],
            num_filters_used: 0,
        }
    }
}

impl CalibrationProfile {
    /// Empty (all-bypass) profile called `name`, truncated if too long.
    pub fn named(name: &str) -> Self {
        let mut profile = Self::default();
        profile.set_name(name);
        profile
    }

    /// Replace the name, silently truncating it to [`NAME_CAPACITY`] bytes.
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_name(name);
    }

    pub fn channel(&self, side: Side) -> &[BiquadCoefficients; BIQUADS_PER_CHANNEL] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn channel_mut(&mut self, side: Side) -> &mut [BiquadCoefficients; BIQUADS_PER_CHANNEL] {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Store `coeffs` at `index` of `channel` (both sides for [`Channel::Both`]).
    pub fn set_filter(
        &mut self,
        channel: Channel,
        index: usize,
        coeffs: BiquadCoefficients,
    ) -> Result<()> {
        check_index(index)?;
        for side in channel.sides() {
            self.channel_mut(side)[index] = coeffs;
        }
        Ok(())
    }

    /// Number of indices where the left or right filter is not bypass.
    pub fn count_active_filters(&self) -> u8 {
        self.left
            .iter()
            .zip(self.right.iter())
            .filter(|(l, r)| !l.is_bypass() || !r.is_bypass())
            .count() as u8
    }

    /// Encode as a valid persisted image. The filter count and checksum are
    /// computed from the current contents.
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        self.encode_with_magic(PROFILE_MAGIC)
    }

    /// Encode with an arbitrary magic value. A wrong magic marks the slot
    /// as free.
    pub(crate) fn encode_with_magic(&self, magic: u32) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[MAGIC_AT..NAME_AT].copy_from_slice(&magic.to_le_bytes());
        let name = self.name.as_bytes();
        buf[NAME_AT..NAME_AT + name.len()].copy_from_slice(name);
        buf[TIMESTAMP_AT..LEFT_AT].copy_from_slice(&self.timestamp.to_le_bytes());
        write_channel(&mut buf[LEFT_AT..RIGHT_AT], &self.left);
        write_channel(&mut buf[RIGHT_AT..COUNT_AT], &self.right);
        buf[COUNT_AT] = self.count_active_filters();
        let crc = crc32(&buf[..CHECKSUM_AT]);
        buf[CHECKSUM_AT..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decode and validate a persisted image.
    ///
    /// A wrong magic or checksum yields [`Error::ProfileNotFound`]: corrupt
    /// and missing records look the same to callers. The filter count is
    /// recomputed from the coefficients rather than taken from the image.
    pub fn from_bytes(buf: &[u8; RECORD_LEN]) -> Result<Self> {
        let magic = read_u32(buf, MAGIC_AT);
        if magic != PROFILE_MAGIC {
            log::error!(
                "Invalid magic: 0x{:08X} (expected 0x{:08X})",
                magic,
                PROFILE_MAGIC
            );
            return Err(Error::ProfileNotFound);
        }

        let stored = read_u32(buf, CHECKSUM_AT);
        let computed = crc32(&buf[..CHECKSUM_AT]);
        if stored != computed {
            log::error!("Checksum mismatch: 0x{:08X} vs 0x{:08X}", stored, computed);
            return Err(Error::ProfileNotFound);
        }

        let mut profile = Self {
            name: read_name(&buf[NAME_AT..TIMESTAMP_AT]),
            timestamp: read_u32(buf, TIMESTAMP_AT),
            left: read_channel(&buf[LEFT_AT..RIGHT_AT]),
            right: read_channel(&buf[RIGHT_AT..COUNT_AT]),
            num_filters_used: 0,
        };
        let active = profile.count_active_filters();
        if buf[COUNT_AT] != active {
            log::warn!(
                "Stored filter count {} does not match coefficients ({}), using {}",
                buf[COUNT_AT],
                active,
                active
            );
        }
        profile.num_filters_used = active;
        Ok(profile)
    }
}

/// CRC-32 (reflected, polynomial 0xEDB88320, init and final XOR 0xFFFFFFFF).
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            crc = (crc >> 1) ^ (0xEDB8_8320 & (crc & 1).wrapping_neg());
        }
    }
    !crc
}

/// Cut `name` to at most [`NAME_CAPACITY`] bytes on a character boundary,
/// stopping early at an embedded NUL.
pub fn truncate_name(name: &str) -> ProfileName {
    let mut out = ProfileName::new();
    for ch in name.chars().take_while(|&c| c != '\0') {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn write_channel(out: &mut [u8], coeffs: &[BiquadCoefficients; BIQUADS_PER_CHANNEL]) {
    let values = coeffs.iter().flat_map(|c| c.as_array());
    for (chunk, v) in out.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
}

fn read_channel(buf: &[u8]) -> [BiquadCoefficients; BIQUADS_PER_CHANNEL] {
    core::array::from_fn(|i| {
        let base = i * 20;
        BiquadCoefficients::from_array(core::array::from_fn(|k| {
            f32::from_bits(read_u32(buf, base + k * 4))
        }))
    })
}

fn read_name(field: &[u8]) -> ProfileName {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let bytes = &field[..end];
    let text = match core::str::from_utf8(bytes) {
        Ok(s) => s,
        // Keep the valid prefix of a name written by something else.
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    };
    truncate_name(text)
}
