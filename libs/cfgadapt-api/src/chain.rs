use serde_json::Value;

use crate::adapter::{FromCfg, ToCfg};
use crate::error::{AdaptError, ConfigError};
use crate::value::{ParamType, ParamValue};

/// Ordered set of decode adapters. First match wins.
///
/// When every adapter declines, the scalar types fall back to a default
/// conversion. Rich types (duration, timestamp, ip) have no default and need
/// a registered adapter.
#[derive(Debug, Clone, Default)]
pub struct DecodeChain {
    adapters: Vec<FromCfg>,
}

impl DecodeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, adapter: FromCfg) -> Self {
        self.push(adapter);
        self
    }

    pub fn push(&mut self, adapter: FromCfg) {
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> &[FromCfg] {
        &self.adapters
    }

    pub fn decode(&self, from: &Value, to: ParamType) -> Result<ParamValue, ConfigError> {
        for adapter in &self.adapters {
            match adapter.decode(from, to) {
                Ok(v) => {
                    tracing::trace!(adapter = adapter.name(), param_type = %to, "adapter matched");
                    return Ok(v);
                }
                Err(AdaptError::NotApplicable) => continue,
                Err(source) => {
                    tracing::debug!(adapter = adapter.name(), param_type = %to, error = %source, "adapter failed");
                    return Err(ConfigError::Adapter {
                        adapter: adapter.name(),
                        source,
                    });
                }
            }
        }
        tracing::trace!(param_type = %to, "no adapter matched, using default conversion");
        default_decode(from, to)
    }
}

impl FromIterator<FromCfg> for DecodeChain {
    fn from_iter<I: IntoIterator<Item = FromCfg>>(iter: I) -> Self {
        Self {
            adapters: iter.into_iter().collect(),
        }
    }
}

/// Ordered set of encode adapters. First match wins, scalars fall back to
/// their plain config form.
#[derive(Debug, Clone, Default)]
pub struct EncodeChain {
    adapters: Vec<ToCfg>,
}

impl EncodeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, adapter: ToCfg) -> Self {
        self.push(adapter);
        self
    }

    pub fn push(&mut self, adapter: ToCfg) {
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> &[ToCfg] {
        &self.adapters
    }

    pub fn encode(&self, from: &ParamValue) -> Result<Value, ConfigError> {
        for adapter in &self.adapters {
            match adapter.encode(from) {
                Ok(v) => {
                    tracing::trace!(adapter = adapter.name(), param_type = %from.param_type(), "adapter matched");
                    return Ok(v);
                }
                Err(AdaptError::NotApplicable) => continue,
                Err(source) => {
                    tracing::debug!(adapter = adapter.name(), error = %source, "adapter failed");
                    return Err(ConfigError::Adapter {
                        adapter: adapter.name(),
                        source,
                    });
                }
            }
        }
        tracing::trace!(param_type = %from.param_type(), "no adapter matched, using default conversion");
        default_encode(from)
    }
}

impl FromIterator<ToCfg> for EncodeChain {
    fn from_iter<I: IntoIterator<Item = ToCfg>>(iter: I) -> Self {
        Self {
            adapters: iter.into_iter().collect(),
        }
    }
}

/// Convert a single value to a ParamValue according to the target type.
fn default_decode(val: &Value, to: ParamType) -> Result<ParamValue, ConfigError> {
    match to {
        ParamType::Bool => {
            let b = val
                .as_bool()
                .ok_or_else(|| ConfigError::Config("expected bool".into()))?;
            Ok(ParamValue::Bool(b))
        }
        ParamType::I64 => {
            let i = val
                .as_i64()
                .ok_or_else(|| ConfigError::Config("expected integer".into()))?;
            Ok(ParamValue::I64(i))
        }
        ParamType::U64 => {
            if let Some(u) = val.as_u64() {
                return Ok(ParamValue::U64(u));
            }
            // as_u64 covers every non-negative integer, what remains is negative.
            let i = val
                .as_i64()
                .ok_or_else(|| ConfigError::Config("expected integer".into()))?;
            Err(ConfigError::Config(format!(
                "expected non-negative integer, got {i}"
            )))
        }
        ParamType::F64 => {
            let f = val
                .as_f64()
                .ok_or_else(|| ConfigError::Config("expected float".into()))?;
            Ok(ParamValue::F64(f))
        }
        ParamType::Str => Ok(ParamValue::Str(flatten_value(val)?)),
        ParamType::Duration | ParamType::Timestamp | ParamType::Ip => Err(ConfigError::Config(
            format!("no adapter converts {} to {to}", kind_name(val)),
        )),
    }
}

fn default_encode(val: &ParamValue) -> Result<Value, ConfigError> {
    match val {
        ParamValue::Bool(b) => Ok(Value::Bool(*b)),
        ParamValue::I64(i) => Ok(Value::from(*i)),
        ParamValue::U64(u) => Ok(Value::from(*u)),
        ParamValue::F64(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| ConfigError::Config(format!("float {f} has no config form"))),
        ParamValue::Str(s) => Ok(Value::String(s.clone())),
        ParamValue::Duration(_) | ParamValue::Timestamp(_) | ParamValue::Ip(_) => Err(
            ConfigError::Config(format!("no adapter converts {} to config", val.param_type())),
        ),
    }
}

/// Flatten a value into a string.
///
/// Scalars are converted directly (no quoting).
/// Arrays and objects are serialized as JSON strings.
fn flatten_value(val: &Value) -> Result<String, ConfigError> {
    match val {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(val).map_err(|e| ConfigError::Config(e.to_string()))
        }
    }
}

fn kind_name(val: &Value) -> &'static str {
    match val {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
