//! TAS5805M register addresses and biquad coefficient memory map.
//!
//! The device exposes a 128-byte window selected by a two-level book/page
//! scheme. Biquad coefficients live in book 0xAA; each 20-byte record holds
//! five big-endian 9.23 words `b0, b1, b2, -a1, -a2`.

use crate::biquad::Side;
use crate::constants::{BIQUADS_PER_CHANNEL, BIQUADS_PER_PAGE, PAGES_PER_CHANNEL};

// ── I2C address ────────────────────────────────────────────────────────────

/// Default 7-bit I2C address (ADR pin strapped to 0x2C).
pub const I2C_ADDR_DEFAULT: u8 = 0x2C;

// ── Book / page selection ──────────────────────────────────────────────────

/// Page select register, present on every page.
pub const PAGE_SELECT: u8 = 0x00;

/// Book select register, reachable from page 0 only.
pub const BOOK_SELECT: u8 = 0x7F;

/// Book/page of normal runtime operation.
pub const BOOK_NORMAL: u8 = 0x00;
pub const PAGE_NORMAL: u8 = 0x00;

/// Book holding the biquad coefficient memory.
pub const BOOK_COEFF: u8 = 0xAA;

// ── Biquad memory layout ───────────────────────────────────────────────────

/// Size of one biquad record in bytes.
pub const BIQUAD_RECORD_LEN: usize = 20;

/// First coefficient page of the left channel (pages 0x24–0x27).
pub const PAGE_LEFT_FIRST: u8 = 0x24;

/// First coefficient page of the right channel (pages 0x32–0x35).
pub const PAGE_RIGHT_FIRST: u8 = 0x32;

/// Record offsets within a page; the gaps skip padding and unrelated fields.
pub const RECORD_OFFSETS: [u8; BIQUADS_PER_PAGE] = [0x08, 0x1C, 0x30, 0x44];

/// First coefficient page of `side`.
pub const fn first_page(side: Side) -> u8 {
    match side {
        Side::Left => PAGE_LEFT_FIRST,
        Side::Right => PAGE_RIGHT_FIRST,
    }
}

/// Page holding biquad `index` of `side`.
pub const fn biquad_page(side: Side, index: usize) -> u8 {
    first_page(side) + (index / BIQUADS_PER_PAGE) as u8
}

/// Byte offset of biquad `index` within its page.
pub const fn biquad_offset(index: usize) -> u8 {
    RECORD_OFFSETS[index % BIQUADS_PER_PAGE]
}

/// First biquad index stored on coefficient page `page` of `side`, if the page belongs to it.
pub fn page_first_index(side: Side, page: u8) -> Option<usize> {
    let rel = page.checked_sub(first_page(side))? as usize;
    (rel < PAGES_PER_CHANNEL).then_some(rel * BIQUADS_PER_PAGE)
}

/// Number of biquad records on a page starting at `first_index` (4, or 3 on the last page).
pub const fn page_capacity(first_index: usize) -> usize {
    let remaining = BIQUADS_PER_CHANNEL - first_index;
    if remaining < BIQUADS_PER_PAGE {
        remaining
    } else {
        BIQUADS_PER_PAGE
    }
}
