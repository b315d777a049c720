//! Test doubles for the bus, delay, clock and persistent store.

use std::collections::HashMap;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::profile::{Clock, Preferences};

// ── Mock I2C ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError(pub ErrorKind);

impl i2c::Error for MockError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Mock I2C that records every write and fails on demand.
pub struct MockI2c {
    /// Every write in chronological order: (address, bytes).
    pub writes: Vec<(u8, Vec<u8>)>,
    /// Fail every call with this kind.
    always_fail: Option<ErrorKind>,
    /// Start failing once this many calls have succeeded.
    fail_after: Option<usize>,
    /// How many calls to fail once `fail_after` is reached.
    fail_count: usize,
}

impl MockI2c {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            always_fail: None,
            fail_after: None,
            fail_count: 0,
        }
    }

    /// Every call fails with `kind`.
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            always_fail: Some(kind),
            ..Self::new()
        }
    }

    /// The first `n` calls succeed, the next `count` fail, the rest succeed.
    pub fn fail_after(n: usize, count: usize) -> Self {
        Self {
            fail_after: Some(n),
            fail_count: count,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.writes.len()
    }

    /// Payload of the nth write.
    pub fn write_at(&self, idx: usize) -> &[u8] {
        &self.writes[idx].1
    }

    /// Writes of exactly `len` bytes (register byte included).
    pub fn writes_of_len(&self, len: usize) -> impl Iterator<Item = &[u8]> {
        self.writes
            .iter()
            .map(|(_, data)| data.as_slice())
            .filter(move |data| data.len() == len)
    }

    /// Coefficient record writes: offset byte + 20 data bytes.
    pub fn record_writes(&self) -> Vec<&[u8]> {
        self.writes_of_len(21).collect()
    }

    /// Values written to the page select register, in order.
    pub fn page_selects(&self) -> Vec<u8> {
        self.writes_of_len(2)
            .filter(|d| d[0] == 0x00)
            .map(|d| d[1])
            .collect()
    }

    fn record(&mut self, address: u8, bytes: &[u8]) -> Result<(), MockError> {
        self.writes.push((address, bytes.to_vec()));
        if let Some(kind) = self.always_fail {
            return Err(MockError(kind));
        }
        if let Some(n) = self.fail_after {
            if self.writes.len() > n && self.fail_count > 0 {
                self.fail_count -= 1;
                return Err(MockError(ErrorKind::Other));
            }
        }
        Ok(())
    }
}

impl ErrorType for MockI2c {
    type Error = MockError;
}

impl I2c for MockI2c {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.record(address, bytes)
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => self.record(address, bytes)?,
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

/// Shorthand for a NACK on the address byte.
pub fn nack() -> ErrorKind {
    ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
}

// ── Mock delay ────────────────────────────────────────────────────────────

/// Records requested delays in milliseconds instead of sleeping.
#[derive(Default)]
pub struct MockDelay {
    pub calls: Vec<u32>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u32 {
        self.calls.iter().sum()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}

// ── Mock persistent store ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockStoreError;

/// Map-backed key/value store with switchable load/save failures.
#[derive(Default)]
pub struct MockPreferences {
    pub entries: HashMap<u32, Vec<u8>>,
    pub load_fails: bool,
    pub save_fails: bool,
    pub saves: usize,
}

impl MockPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MockPreferences {
    type Error = MockStoreError;

    fn load(&mut self, key: u32, buf: &mut [u8]) -> Result<bool, Self::Error> {
        if self.load_fails {
            return Err(MockStoreError);
        }
        match self.entries.get(&key) {
            Some(data) if data.len() == buf.len() => {
                buf.copy_from_slice(data);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn save(&mut self, key: u32, buf: &[u8]) -> Result<(), Self::Error> {
        if self.save_fails {
            return Err(MockStoreError);
        }
        self.entries.insert(key, buf.to_vec());
        self.saves += 1;
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────

/// Clock frozen at a fixed second count.
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn now_secs(&mut self) -> u32 {
        self.0
    }
}
