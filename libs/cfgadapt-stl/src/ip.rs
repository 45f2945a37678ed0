use std::net::{AddrParseError, IpAddr};

use serde_json::Value;

use cfgadapt_api::adapter::{DecodeAdapter, EncodeAdapter};
use cfgadapt_api::error::AdaptError;
use cfgadapt_api::value::{ParamType, ParamValue};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed parsing ip '{input}': {source}")]
pub struct IpParseError {
    pub input: String,
    #[source]
    pub source: AddrParseError,
}

/// Parse an IPv4 dotted-quad or IPv6 literal.
pub fn parse_ip(input: &str) -> Result<IpAddr, IpParseError> {
    input.parse().map_err(|source| IpParseError {
        input: input.to_string(),
        source,
    })
}

/// Decodes a config string into `ParamValue::Ip`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToIp;

impl DecodeAdapter for StringToIp {
    fn decode(&self, from: &Value, to: ParamType) -> Result<ParamValue, AdaptError> {
        match (from, to) {
            (Value::String(s), ParamType::Ip) => parse_ip(s)
                .map(ParamValue::Ip)
                .map_err(AdaptError::conversion),
            _ => Err(AdaptError::NotApplicable),
        }
    }
}

/// Encodes `ParamValue::Ip` in its standard textual form.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpToCfg;

impl EncodeAdapter for IpToCfg {
    fn encode(&self, from: &ParamValue) -> Result<Value, AdaptError> {
        match from {
            ParamValue::Ip(ip) => Ok(Value::String(ip.to_string())),
            _ => Err(AdaptError::NotApplicable),
        }
    }
}
