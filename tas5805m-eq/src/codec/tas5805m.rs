//! TAS5805M register driver.
//!
//! Owns the I2C bus and delay provider, retries transient write failures and
//! steers the two-level book/page window. The biquad programmer
//! ([`super::biquad`]) and the design-and-write helpers build on the methods
//! here.
//!
//! The driver is generic over any [`embedded_hal::i2c::I2c`] and
//! [`embedded_hal::delay::DelayNs`] implementation.
//!
//! # Example
//!
//! ```ignore
//! let mut amp = Tas5805m::new(i2c, delay);
//! amp.write_biquad(Channel::Both, 0, &BiquadCoefficients::BYPASS)?;
//! let (i2c, delay) = amp.release();
//! ```

use core::ops::{Deref, DerefMut};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, I2c};

use super::registers as reg;
use crate::biquad::{BiquadCoefficients, Side};
use crate::constants::BIQUADS_PER_CHANNEL;
use crate::error::{BusFault, Error, Parameter, Result};

/// Largest payload accepted by [`Tas5805m::write_bytes`]: one full page window
/// minus the register byte.
pub const MAX_WRITE_LEN: usize = 127;

// ── Configuration ──────────────────────────────────────────────────────────

/// How often a bus write is attempted before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u8,
    /// Pause between attempts. Not applied after the final attempt.
    pub retry_delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 5,
        }
    }
}

/// Bus address and timing used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// 7-bit I2C address.
    pub address: u8,
    pub retry: RetryPolicy,
    /// Pause after each step of a book/page switch.
    pub settle_ms: u32,
    /// Pause after writing a coefficient record (or page of records).
    pub commit_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            address: reg::I2C_ADDR_DEFAULT,
            retry: RetryPolicy::default(),
            settle_ms: 2,
            commit_ms: 5,
        }
    }
}

// ── Driver struct ──────────────────────────────────────────────────────────

/// TAS5805M amplifier driver.
///
/// Besides the bus handles it keeps a shadow copy of the last coefficients
/// successfully written to each of the 30 biquad slots, so the current chip
/// state can be captured as a profile without reading it back.
pub struct Tas5805m<I2C, D> {
    i2c: I2C,
    delay: D,
    config: DriverConfig,
    shadow: [[BiquadCoefficients; BIQUADS_PER_CHANNEL]; 2],
}

impl<I2C, D> Tas5805m<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Default I2C address.
    pub const DEFAULT_ADDRESS: u8 = reg::I2C_ADDR_DEFAULT;

    /// Create a new driver with default address and timing.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_config(i2c, delay, DriverConfig::default())
    }

    /// Create a new driver with a specific I2C address and default timing.
    pub fn new_with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self::with_config(
            i2c,
            delay,
            DriverConfig {
                address,
                ..DriverConfig::default()
            },
        )
    }

    /// Create a new driver with explicit address, retry policy and timing.
    pub fn with_config(i2c: I2C, delay: D, config: DriverConfig) -> Self {
        Self {
            i2c,
            delay,
            config,
            shadow: [[BiquadCoefficients::BYPASS; BIQUADS_PER_CHANNEL]; 2],
        }
    }

    /// Active driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 7-bit I2C address the driver talks to.
    pub fn address(&self) -> u8 {
        self.config.address
    }

    /// Release the I2C bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    // ── Low-level I2C helpers ──────────────────────────────────────────

    /// Write one byte to `register`, retrying per the configured policy.
    pub fn write_byte(&mut self, register: u8, value: u8) -> Result<()> {
        self.write_with_retry(&[register, value])
    }

    /// Write `data` starting at `register` in a single transaction,
    /// retrying per the configured policy.
    pub fn write_bytes(&mut self, register: u8, data: &[u8]) -> Result<()> {
        if data.len() > MAX_WRITE_LEN {
            log::error!(
                "Write of {} bytes at 0x{:02X} exceeds the {}-byte page window",
                data.len(),
                register,
                MAX_WRITE_LEN
            );
            return Err(Error::InvalidParameter(Parameter::Length));
        }
        let mut buf = [0u8; MAX_WRITE_LEN + 1];
        buf[0] = register;
        buf[1..=data.len()].copy_from_slice(data);
        self.write_with_retry(&buf[..=data.len()])
    }

    fn write_with_retry(&mut self, frame: &[u8]) -> Result<()> {
        let attempts = self.config.retry.max_attempts.max(1);
        let mut last = ErrorKind::Other;
        for attempt in 1..=attempts {
            match self.i2c.write(self.config.address, frame) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last = i2c::Error::kind(&e);
                    log::warn!(
                        "I2C write to 0x{:02X} failed (attempt {}/{}): {:?}",
                        frame[0],
                        attempt,
                        attempts,
                        last
                    );
                    if attempt < attempts {
                        self.delay_ms(self.config.retry.retry_delay_ms);
                    }
                }
            }
        }
        log::error!(
            "I2C write to 0x{:02X} failed after {} attempts",
            frame[0],
            attempts
        );
        Err(Error::Bus(classify(last)))
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        if ms > 0 {
            self.delay.delay_ms(ms);
        }
    }

    // ── Book / page navigation ─────────────────────────────────────────

    /// Move the register window to `book`/`page`.
    ///
    /// The book register is only reachable from page 0, so this writes
    /// page 0, then the book, then the target page, settling after each
    /// step. Stops at the first failed step.
    pub fn select_book_page(&mut self, book: u8, page: u8) -> Result<()> {
        let settle = self.config.settle_ms;
        self.write_byte(reg::PAGE_SELECT, reg::PAGE_NORMAL)?;
        self.delay_ms(settle);
        self.write_byte(reg::BOOK_SELECT, book)?;
        self.delay_ms(settle);
        self.write_byte(reg::PAGE_SELECT, page)?;
        self.delay_ms(settle);
        log::trace!("Selected book 0x{:02X} page 0x{:02X}", book, page);
        Ok(())
    }

    /// Put the window back on book 0, page 0.
    ///
    /// Both writes are attempted even if the first fails; the first error is
    /// returned.
    pub fn return_to_normal(&mut self) -> Result<()> {
        let page = self.write_byte(reg::PAGE_SELECT, reg::PAGE_NORMAL);
        let book = self.write_byte(reg::BOOK_SELECT, reg::BOOK_NORMAL);
        page.and(book)
    }

    /// Borrow the driver for a run of coefficient-book writes.
    ///
    /// The window is returned to book 0 / page 0 when the session is dropped,
    /// on success and error paths alike.
    pub fn coefficient_session(&mut self) -> CoefficientSession<'_, I2C, D> {
        CoefficientSession { dev: self }
    }

    // ── Shadow state ───────────────────────────────────────────────────

    /// Coefficients last written successfully to each slot of `side`.
    pub fn shadow(&self, side: Side) -> &[BiquadCoefficients; BIQUADS_PER_CHANNEL] {
        &self.shadow[side_slot(side)]
    }

    pub(crate) fn record_shadow(&mut self, side: Side, index: usize, coeffs: BiquadCoefficients) {
        self.shadow[side_slot(side)][index] = coeffs;
    }
}

const fn side_slot(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

fn classify(kind: ErrorKind) -> BusFault {
    match kind {
        ErrorKind::NoAcknowledge(_) => BusFault::NotAcknowledged,
        ErrorKind::Bus | ErrorKind::ArbitrationLoss | ErrorKind::Overrun => BusFault::Bus,
        _ => BusFault::Other,
    }
}

// ── Coefficient session guard ──────────────────────────────────────────────

/// Exclusive borrow of the driver while the window may point into the
/// coefficient book.
///
/// Dereferences to [`Tas5805m`]. Dropping it calls
/// [`Tas5805m::return_to_normal`]; a failure there is logged, since the
/// triggering operation has already produced its own result.
pub struct CoefficientSession<'a, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    dev: &'a mut Tas5805m<I2C, D>,
}

impl<I2C, D> Deref for CoefficientSession<'_, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Target = Tas5805m<I2C, D>;

    fn deref(&self) -> &Self::Target {
        self.dev
    }
}

impl<I2C, D> DerefMut for CoefficientSession<'_, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.dev
    }
}

impl<I2C, D> Drop for CoefficientSession<'_, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn drop(&mut self) {
        if let Err(e) = self.dev.return_to_normal() {
            log::warn!("Failed to return to book 0 / page 0: {}", e);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
