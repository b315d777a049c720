//! Calibration profiles and their persistent store.
//!
//! A [`CalibrationProfile`] holds all 30 biquads plus a name and timestamp.
//! [`ProfileStore`] keeps up to [`MAX_PROFILES`](crate::constants::MAX_PROFILES)
//! of them in a [`Preferences`] key/value store, tracks which one is active
//! and re-applies it to a [`Tas5805m`](crate::codec::Tas5805m) on boot.
//!
//! # Feature gate
//!
//! This module is available when the `tas5805m` feature is enabled (on by default).

mod apply;
mod record;
mod store;

pub use record::{crc32, truncate_name, CalibrationProfile, ProfileName, NAME_CAPACITY, RECORD_LEN};
pub use store::{
    fnv1a_hash, slot_key, ActiveProfile, Clock, Preferences, ProfileStore, StoreConfig,
};
