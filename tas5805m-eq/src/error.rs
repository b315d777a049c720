//! Crate-wide error type.

use core::fmt;

/// Caller-supplied value that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Channel,
    Index,
    Frequency,
    Gain,
    Q,
    Slope,
    Coefficient,
    SampleRate,
    Length,
    PageCount,
    Page,
    Slot,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parameter::Channel => "channel",
            Parameter::Index => "biquad index",
            Parameter::Frequency => "frequency",
            Parameter::Gain => "gain",
            Parameter::Q => "Q",
            Parameter::Slope => "slope",
            Parameter::Coefficient => "coefficient",
            Parameter::SampleRate => "sample rate",
            Parameter::Length => "write length",
            Parameter::PageCount => "page record count",
            Parameter::Page => "coefficient page",
            Parameter::Slot => "profile slot",
        };
        f.write_str(name)
    }
}

/// Why the last attempt of a bus write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusFault {
    /// The device did not acknowledge its address or a data byte.
    NotAcknowledged,
    /// Bus-level fault: arbitration loss, overrun or a malformed transfer.
    Bus,
    /// Anything the bus implementation could not classify, including timeouts.
    Other,
}

impl fmt::Display for BusFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusFault::NotAcknowledged => f.write_str("not acknowledged"),
            BusFault::Bus => f.write_str("bus error"),
            BusFault::Other => f.write_str("unknown error"),
        }
    }
}

/// Errors returned by the driver, the filter validators and the profile store.
///
/// Corrupt and missing profiles are both reported as [`Error::ProfileNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A parameter was out of range or not finite. No I/O was attempted.
    #[error("invalid {0}")]
    InvalidParameter(Parameter),

    /// A bus write still failed after every retry.
    #[error("I2C write failed: {0}")]
    Bus(BusFault),

    /// No valid profile matched the name or slot.
    #[error("profile not found")]
    ProfileNotFound,

    /// Every profile slot already holds a valid profile.
    #[error("no free profile slot")]
    NoFreeSlot,

    /// The persistent store rejected a write.
    #[error("persistent storage write failed")]
    Storage,
}

/// Shorthand result type.
pub type Result<T> = core::result::Result<T, Error>;

/// Record `result`'s error unless an earlier one is already held.
///
/// Used by operations that keep going past individual failures and report
/// the first.
pub(crate) fn keep_first(first: &mut Option<Error>, result: Result<()>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}
