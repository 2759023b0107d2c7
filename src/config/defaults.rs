//! Configuration default values
//!
//! This module contains all the default values for configuration options,
//! making them easily changeable in one central location.

// Sources
pub const DEFAULT_TEMPLATE_PATH: &str = "radioguide.xml";
pub const DEFAULT_OUTPUT_PATH: &str = "guide.xml";

// Schedule
pub const DEFAULT_DAYS: u32 = 1;
pub const DEFAULT_BLOCK_MINUTES: u32 = 30;
pub const DEFAULT_INSTANCE_DURATION_MINUTES: u32 = 90;
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_OFFSET: &str = " +0000";

// Fetch
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_USER_AGENT: &str = concat!("epg-merger/", env!("CARGO_PKG_VERSION"));

// Limits
pub const MAX_DAYS: u32 = 31;
