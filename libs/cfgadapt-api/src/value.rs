use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset, TimeDelta};

/// Target type descriptor: which typed value the host wants populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Bool,
    I64,
    U64,
    F64,
    Str,
    Duration,
    Timestamp,
    Ip,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Bool => "bool",
            ParamType::I64 => "i64",
            ParamType::U64 => "u64",
            ParamType::F64 => "f64",
            ParamType::Str => "str",
            ParamType::Duration => "duration",
            ParamType::Timestamp => "timestamp",
            ParamType::Ip => "ip",
        };
        f.write_str(name)
    }
}

/// Typed config value.
///
/// Scalars come straight from the config tree. `Duration`, `Timestamp` and `Ip`
/// only ever appear as strings in config and need an adapter on both sides.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    /// Signed, nanosecond precision.
    Duration(TimeDelta),
    /// Keeps the parsed offset so it renders back unchanged.
    Timestamp(DateTime<FixedOffset>),
    Ip(IpAddr),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::I64(_) => ParamType::I64,
            ParamValue::U64(_) => ParamType::U64,
            ParamValue::F64(_) => ParamType::F64,
            ParamValue::Str(_) => ParamType::Str,
            ParamValue::Duration(_) => ParamType::Duration,
            ParamValue::Timestamp(_) => ParamType::Timestamp,
            ParamValue::Ip(_) => ParamType::Ip,
        }
    }
}

impl From<TimeDelta> for ParamValue {
    fn from(v: TimeDelta) -> Self {
        ParamValue::Duration(v)
    }
}

impl From<DateTime<FixedOffset>> for ParamValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        ParamValue::Timestamp(v)
    }
}

impl From<IpAddr> for ParamValue {
    fn from(v: IpAddr) -> Self {
        ParamValue::Ip(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_type_matches_variant() {
        assert_eq!(ParamValue::from(TimeDelta::seconds(1)).param_type(), ParamType::Duration);
        assert_eq!(
            ParamValue::from(IpAddr::from([127, 0, 0, 1])).param_type(),
            ParamType::Ip
        );
        assert_eq!(ParamValue::Str("x".into()).param_type(), ParamType::Str);
    }

    #[test]
    fn param_type_deserializes_snake_case() {
        let t: ParamType = serde_json::from_str("\"timestamp\"").unwrap();
        assert_eq!(t, ParamType::Timestamp);
        assert_eq!(serde_json::to_string(&ParamType::Ip).unwrap(), "\"ip\"");
        assert_eq!(ParamType::Duration.to_string(), "duration");
    }
}
