//! Standard config adapters: durations, IP addresses and timestamps.
//!
//! Each constructor returns a named adapter ready to register with a
//! [`DecodeChain`] or [`EncodeChain`]:
//!
//! ```ignore
//! let decode = DecodeChain::new()
//!     .with(cfgadapt_stl::adapt_string_to_duration())
//!     .with(cfgadapt_stl::adapt_string_to_time(cfgadapt_stl::layout::RFC3339))
//!     .with(cfgadapt_stl::adapt_string_to_ip());
//! ```
//!
//! [`DecodeChain`]: cfgadapt_api::chain::DecodeChain
//! [`EncodeChain`]: cfgadapt_api::chain::EncodeChain

pub mod duration;
pub mod ip;
pub mod layout;
pub mod time;

use cfgadapt_api::adapter::{FromCfg, ToCfg};

pub use duration::{DurationError, DurationToCfg, StringToDuration, format_duration, parse_duration};
pub use ip::{IpParseError, IpToCfg, StringToIp, parse_ip};
pub use layout::{Layout, LayoutMismatch, TimeFormatError, TimeParseError};
pub use time::{StringToTime, TimeToCfg};

/// Converts a config string to a duration, e.g. `"1h30m"`.
pub fn adapt_string_to_duration() -> FromCfg {
    FromCfg::new("string_to_duration", StringToDuration)
}

/// Converts a duration to its config string, e.g. `"1h30m0s"`.
pub fn adapt_duration_to_cfg() -> ToCfg {
    ToCfg::new("duration_to_cfg", DurationToCfg)
}

/// Converts a config string to an IPv4 or IPv6 address.
pub fn adapt_string_to_ip() -> FromCfg {
    FromCfg::new("string_to_ip", StringToIp)
}

/// Converts an IP address to its config string.
pub fn adapt_ip_to_cfg() -> ToCfg {
    ToCfg::new("ip_to_cfg", IpToCfg)
}

/// Converts a config string to a timestamp. `layout` is the string form,
/// see [`layout`].
pub fn adapt_string_to_time(layout: &str) -> FromCfg {
    FromCfg::new("string_to_time", StringToTime::new(layout))
}

/// Converts a timestamp to a config string matching `layout`.
pub fn adapt_time_to_cfg(layout: &str) -> ToCfg {
    ToCfg::new("time_to_cfg", TimeToCfg::new(layout))
}
