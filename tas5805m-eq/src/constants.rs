/// Number of biquad slots per stereo channel.
pub const BIQUADS_PER_CHANNEL: usize = 15;

/// Maximum number of biquad records that share one coefficient page.
pub const BIQUADS_PER_PAGE: usize = 4;

/// Number of coefficient pages per channel.
pub const PAGES_PER_CHANNEL: usize = 4;

/// Sample rate assumed by the filter designers when the caller has no better value.
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// Number of profile slots in persistent storage.
pub const MAX_PROFILES: usize = 5;

/// Size of the null-padded name field in a stored profile (31 characters + NUL).
pub const MAX_PROFILE_NAME_LEN: usize = 32;

/// Format identifier at the start of every stored profile ("TAS5").
pub const PROFILE_MAGIC: u32 = 0x5441_5335;

/// Per-coefficient tolerance used when deciding whether a biquad is bypass.
pub const BYPASS_TOLERANCE: f32 = 1e-4;
