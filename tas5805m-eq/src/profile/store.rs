//! Slot-based profile persistence and the active-profile pointer.
//!
//! Profiles live in `N` slots keyed `"profile_0"` .. `"profile_{N-1}"`; the
//! active slot index is stored separately under `"active_profile"` as a
//! signed byte, `-1` meaning none. A slot is occupied when its record is
//! present and passes magic and checksum validation.

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::{String, Vec};

use super::record::{truncate_name, CalibrationProfile, ProfileName, RECORD_LEN};
use crate::biquad::Channel;
use crate::codec::Tas5805m;
use crate::constants::{BIQUADS_PER_CHANNEL, MAX_PROFILES};
use crate::error::{keep_first, Error, Parameter, Result};

// ── Collaborators ──────────────────────────────────────────────────────────

/// Fixed-size key/value persistence (flash, NVS, EEPROM...).
pub trait Preferences {
    type Error: fmt::Debug;

    /// Fill `buf` from the value stored under `key`.
    ///
    /// Returns `Ok(false)` when nothing is stored or the stored value has a
    /// different size.
    fn load(&mut self, key: u32, buf: &mut [u8]) -> core::result::Result<bool, Self::Error>;

    fn save(&mut self, key: u32, buf: &[u8]) -> core::result::Result<(), Self::Error>;
}

impl<T: Preferences + ?Sized> Preferences for &mut T {
    type Error = T::Error;

    fn load(&mut self, key: u32, buf: &mut [u8]) -> core::result::Result<bool, Self::Error> {
        T::load(self, key, buf)
    }

    fn save(&mut self, key: u32, buf: &[u8]) -> core::result::Result<(), Self::Error> {
        T::save(self, key, buf)
    }
}

/// Source of the timestamp written into saved profiles.
pub trait Clock {
    fn now_secs(&mut self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_secs(&mut self) -> u32 {
        T::now_secs(self)
    }
}

/// 32-bit FNV-1a hash, used to turn key names into store keys.
pub const fn fnv1a_hash(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(16_777_619);
        i += 1;
    }
    hash
}

const ACTIVE_KEY: u32 = fnv1a_hash(b"active_profile");

/// Store key of profile slot `slot`.
pub fn slot_key(slot: usize) -> u32 {
    // "profile_" plus the 20 digits of u64::MAX.
    let mut key: String<28> = String::new();
    if write!(key, "profile_{}", slot).is_err() {
        log::error!("Slot key for {} overflowed", slot);
    }
    fnv1a_hash(key.as_bytes())
}

// ── Configuration ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Pause after each biquad index while applying a profile.
    pub apply_gap_ms: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { apply_gap_ms: 2 }
    }
}

/// What the active-profile pointer currently refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveProfile {
    /// No active profile.
    None,
    /// The pointer names a slot that no longer holds a valid profile.
    Missing(usize),
    Named(ProfileName),
}

/// Renders as `none`, `error`, or the profile name.
impl fmt::Display for ActiveProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveProfile::None => f.write_str("none"),
            ActiveProfile::Missing(_) => f.write_str("error"),
            ActiveProfile::Named(name) => f.write_str(name),
        }
    }
}

// ── Store ──────────────────────────────────────────────────────────────────

/// Named calibration profiles in `N` persistent slots.
pub struct ProfileStore<P, C, const N: usize = MAX_PROFILES> {
    prefs: P,
    clock: C,
    config: StoreConfig,
    active: Option<usize>,
}

impl<P: Preferences, C: Clock> ProfileStore<P, C, MAX_PROFILES> {
    /// Open a store with [`MAX_PROFILES`] slots and default timing.
    pub fn new(prefs: P, clock: C) -> Self {
        Self::open(prefs, clock, StoreConfig::default())
    }

    /// Open a store with [`MAX_PROFILES`] slots and custom timing.
    pub fn with_config(prefs: P, clock: C, config: StoreConfig) -> Self {
        Self::open(prefs, clock, config)
    }
}

impl<P: Preferences, C: Clock, const N: usize> ProfileStore<P, C, N> {
    /// Open a store with `N` slots, reading the persisted active index.
    ///
    /// An index outside `0..N` is reset to none with a warning.
    pub fn open(mut prefs: P, clock: C, config: StoreConfig) -> Self {
        let mut raw = [0u8; 1];
        let active = match prefs.load(ACTIVE_KEY, &mut raw) {
            Ok(true) => {
                let index = raw[0] as i8;
                match usize::try_from(index) {
                    Ok(slot) if slot < N => {
                        log::info!("Active profile index: {}", slot);
                        Some(slot)
                    }
                    _ if index == -1 => {
                        log::info!("No active profile set");
                        None
                    }
                    _ => {
                        log::warn!("Invalid active profile index: {}, resetting", index);
                        None
                    }
                }
            }
            Ok(false) => {
                log::info!("No active profile set");
                None
            }
            Err(e) => {
                log::warn!("Failed to read active profile index: {:?}", e);
                None
            }
        };

        Self {
            prefs,
            clock,
            config,
            active,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Slot the active pointer refers to, whether or not it is still valid.
    pub fn active_slot(&self) -> Option<usize> {
        self.active
    }

    /// Release the store and clock.
    pub fn release(self) -> (P, C) {
        (self.prefs, self.clock)
    }

    // ── CRUD ───────────────────────────────────────────────────────────

    /// Save `profile` under `name`, returning the slot used.
    ///
    /// Reuses the slot already holding `name`, else takes the first free one.
    /// The name is truncated, the timestamp taken from the clock and the
    /// filter count recomputed before writing.
    pub fn save(&mut self, name: &str, profile: &CalibrationProfile) -> Result<usize> {
        let slot = match self.find_slot(name) {
            Some(slot) => slot,
            None => self.find_free_slot().ok_or_else(|| {
                log::error!("No available profile slots (max {})", N);
                Error::NoFreeSlot
            })?,
        };

        let mut record = profile.clone();
        record.set_name(name);
        record.timestamp = self.clock.now_secs();
        record.num_filters_used = record.count_active_filters();

        self.prefs
            .save(slot_key(slot), &record.to_bytes())
            .map_err(|e| {
                log::error!("Failed to save profile to slot {}: {:?}", slot, e);
                Error::Storage
            })?;

        log::info!(
            "Saved profile '{}' to slot {} ({} filters)",
            record.name,
            slot,
            record.num_filters_used
        );
        Ok(slot)
    }

    /// Load the first valid profile called `name`.
    pub fn load(&mut self, name: &str) -> Result<CalibrationProfile> {
        let slot = self.find_slot(name).ok_or_else(|| {
            log::error!("Profile '{}' not found", name);
            Error::ProfileNotFound
        })?;
        self.load_by_index(slot)
    }

    /// Load the profile in `slot`. Missing and corrupt slots both fail with
    /// [`Error::ProfileNotFound`].
    pub fn load_by_index(&mut self, slot: usize) -> Result<CalibrationProfile> {
        check_slot::<N>(slot)?;
        let profile = self.read_slot(slot)?;
        log::info!(
            "Loaded profile '{}' from slot {} ({} filters)",
            profile.name,
            slot,
            profile.num_filters_used
        );
        Ok(profile)
    }

    /// Invalidate the slot holding `name` and clear the active pointer if it
    /// pointed there.
    ///
    /// The slot is overwritten with an all-bypass, unnamed record carrying a
    /// wrong magic, so no coefficients or name survive.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let slot = self.find_slot(name).ok_or_else(|| {
            log::error!("Profile '{}' not found", name);
            Error::ProfileNotFound
        })?;

        let blank = CalibrationProfile::default().encode_with_magic(0);
        self.prefs.save(slot_key(slot), &blank).map_err(|e| {
            log::error!("Failed to clear slot {}: {:?}", slot, e);
            Error::Storage
        })?;

        if self.active == Some(slot) {
            self.set_active_slot(None)?;
        }

        log::info!("Deleted profile '{}' from slot {}", name, slot);
        Ok(())
    }

    /// Names of all valid profiles in slot order.
    pub fn list(&mut self) -> Vec<ProfileName, N> {
        let mut names = Vec::new();
        for slot in 0..N {
            if let Ok(profile) = self.read_slot(slot) {
                // At most N slots, so this never overflows.
                let _ = names.push(profile.name);
            }
        }
        log::info!("Found {} profiles", names.len());
        names
    }

    // ── Active profile ─────────────────────────────────────────────────

    /// Mark the profile called `name` as the one to apply on boot.
    pub fn set_active(&mut self, name: &str) -> Result<usize> {
        let slot = self.find_slot(name).ok_or_else(|| {
            log::error!("Profile '{}' not found", name);
            Error::ProfileNotFound
        })?;
        self.set_active_slot(Some(slot))?;
        Ok(slot)
    }

    /// Point the active pointer at `slot`, or clear it with `None`.
    ///
    /// The in-memory pointer only changes once the store accepted it.
    pub fn set_active_slot(&mut self, slot: Option<usize>) -> Result<()> {
        let raw: i8 = match slot {
            Some(s) => {
                check_slot::<N>(s)?;
                i8::try_from(s).map_err(|_| Error::InvalidParameter(Parameter::Slot))?
            }
            None => -1,
        };

        self.prefs.save(ACTIVE_KEY, &[raw as u8]).map_err(|e| {
            log::error!("Failed to save active profile index: {:?}", e);
            Error::Storage
        })?;
        self.active = slot;

        match slot {
            Some(s) => log::info!("Set active profile to slot {}", s),
            None => log::info!("Cleared active profile"),
        }
        Ok(())
    }

    /// Resolve the active pointer. Its `Display` gives `none`, `error` or the
    /// profile name.
    pub fn active_profile(&mut self) -> ActiveProfile {
        match self.active {
            None => ActiveProfile::None,
            Some(slot) => match self.read_slot(slot) {
                Ok(profile) => ActiveProfile::Named(profile.name),
                Err(_) => ActiveProfile::Missing(slot),
            },
        }
    }

    /// Write the active profile to the amplifier, one biquad at a time.
    ///
    /// Succeeds without I/O when no profile is active. Every biquad is
    /// attempted, left then right per index, with a short pause after each
    /// index; the first write error is returned.
    pub fn apply_active<I2C, D>(&mut self, amp: &mut Tas5805m<I2C, D>) -> Result<()>
    where
        I2C: I2c,
        D: DelayNs,
    {
        let Some(slot) = self.active else {
            log::info!("No active profile to load");
            return Ok(());
        };

        let profile = self.load_by_index(slot).map_err(|e| {
            log::error!("Failed to load active profile");
            e
        })?;
        log::info!("Applying active profile '{}'", profile.name);

        let mut first = None;
        for index in 0..BIQUADS_PER_CHANNEL {
            let left = amp.write_biquad(Channel::Left, index, &profile.left[index]);
            if left.is_err() {
                log::error!("Failed to write left biquad {}", index);
            }
            keep_first(&mut first, left);

            let right = amp.write_biquad(Channel::Right, index, &profile.right[index]);
            if right.is_err() {
                log::error!("Failed to write right biquad {}", index);
            }
            keep_first(&mut first, right);

            amp.delay_ms(self.config.apply_gap_ms);
        }

        match first {
            None => {
                log::info!(
                    "Applied profile '{}' ({} filters)",
                    profile.name,
                    profile.num_filters_used
                );
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    // ── Slot scanning ──────────────────────────────────────────────────

    fn read_slot(&mut self, slot: usize) -> Result<CalibrationProfile> {
        let mut buf = [0u8; RECORD_LEN];
        match self.prefs.load(slot_key(slot), &mut buf) {
            Ok(true) => CalibrationProfile::from_bytes(&buf).map_err(|e| {
                log::debug!("Profile in slot {} failed validation", slot);
                e
            }),
            Ok(false) => Err(Error::ProfileNotFound),
            Err(e) => {
                log::warn!("Failed to read slot {}: {:?}", slot, e);
                Err(Error::ProfileNotFound)
            }
        }
    }

    /// First valid slot whose stored name equals `name` after truncation.
    fn find_slot(&mut self, name: &str) -> Option<usize> {
        let wanted = truncate_name(name);
        (0..N).find(|&slot| {
            self.read_slot(slot)
                .is_ok_and(|profile| profile.name == wanted)
        })
    }

    fn find_free_slot(&mut self) -> Option<usize> {
        (0..N).find(|&slot| self.read_slot(slot).is_err())
    }
}

fn check_slot<const N: usize>(slot: usize) -> Result<()> {
    if slot >= N {
        log::error!("Invalid profile slot: {} (must be 0-{})", slot, N - 1);
        return Err(Error::InvalidParameter(Parameter::Slot));
    }
    Ok(())
}
