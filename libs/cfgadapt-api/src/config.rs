use std::collections::HashSet;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde_json::{Map, Value};

use crate::chain::{DecodeChain, EncodeChain};
use crate::error::ConfigError;
use crate::value::{ParamType, ParamValue};

/// Declaration of a single config parameter.
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<ParamValue>,
    pub description: String,
}

/// Decoded config values, in declaration (or insertion) order.
///
/// Consumers read values via typed getters, no parsing needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigValues {
    entries: Vec<(String, ParamValue)>,
}

impl ConfigValues {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(ParamValue::U64(v)) => Some(*v),
            // Most config formats lack unsigned integers; accept non-negative i64.
            Some(ParamValue::I64(v)) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(ParamValue::F64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParamValue::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_duration(&self, name: &str) -> Option<TimeDelta> {
        match self.get(name) {
            Some(ParamValue::Duration(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_timestamp(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        match self.get(name) {
            Some(ParamValue::Timestamp(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_ip(&self, name: &str) -> Option<IpAddr> {
        match self.get(name) {
            Some(ParamValue::Ip(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Decode a config object into `ConfigValues`.
///
/// `config` is a format-independent `serde_json::Value` (already deserialized
/// from TOML, YAML, or HCL by the config loader).
///
/// - Rejects unknown keys (not declared in `params`).
/// - Decodes each present key through `chain` into the declared `ParamType`.
/// - Absent keys take their default; absent required keys are an error.
pub fn decode_config(
    config: Option<&Value>,
    params: &[ConfigParam],
    chain: &DecodeChain,
) -> Result<ConfigValues, ConfigError> {
    let empty = Map::new();
    let obj = match config {
        Some(Value::Object(map)) => map,
        Some(_) => return Err(ConfigError::Config("config must be a table/object".into())),
        None => &empty,
    };

    let known: HashSet<&str> = params.iter().map(|p| p.name.as_str()).collect();
    for key in obj.keys() {
        if !known.contains(key.as_str()) {
            return Err(ConfigError::Config(format!("unknown parameter '{key}'")));
        }
    }

    let mut values = ConfigValues::new();
    for param in params {
        match obj.get(&param.name) {
            Some(v) => {
                let pv = chain
                    .decode(v, param.param_type)
                    .map_err(|e| e.with_context(format!("parameter '{}'", param.name)))?;
                values.set(&param.name, pv);
            }
            None => {
                if let Some(ref default) = param.default {
                    values.set(&param.name, default.clone());
                } else if param.required {
                    return Err(ConfigError::Config(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
            }
        }
    }

    tracing::debug!(params = params.len(), decoded = values.len(), "decoded config");
    Ok(values)
}

/// Encode `ConfigValues` back into a config object, e.g. to dump the
/// effective configuration.
pub fn encode_config(values: &ConfigValues, chain: &EncodeChain) -> Result<Value, ConfigError> {
    let mut obj = Map::new();
    for (name, value) in values.iter() {
        let v = chain
            .encode(value)
            .map_err(|e| e.with_context(format!("parameter '{name}'")))?;
        obj.insert(name.to_string(), v);
    }
    Ok(Value::Object(obj))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params() -> Vec<ConfigParam> {
        vec![
            ConfigParam {
                name: "workers".into(),
                param_type: ParamType::U64,
                required: true,
                default: None,
                description: "Worker count".into(),
            },
            ConfigParam {
                name: "label".into(),
                param_type: ParamType::Str,
                required: false,
                default: Some(ParamValue::Str("main".into())),
                description: "Instance label".into(),
            },
            ConfigParam {
                name: "verbose".into(),
                param_type: ParamType::Bool,
                required: false,
                default: None,
                description: "Verbose output".into(),
            },
        ]
    }

    #[test]
    fn decodes_present_and_default_values() {
        let cfg = json!({ "workers": 4 });
        let values = decode_config(Some(&cfg), &params(), &DecodeChain::new()).unwrap();

        assert_eq!(values.get_u64("workers"), Some(4));
        assert_eq!(values.get_str("label"), Some("main"));
        assert_eq!(values.get_bool("verbose"), None);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn rejects_unknown_keys() {
        let cfg = json!({ "workers": 4, "colour": "red" });
        let err = decode_config(Some(&cfg), &params(), &DecodeChain::new()).unwrap_err();
        assert_eq!(err.to_string(), "config error: unknown parameter 'colour'");
    }

    #[test]
    fn reports_missing_required() {
        let err = decode_config(None, &params(), &DecodeChain::new()).unwrap_err();
        assert_eq!(err.to_string(), "config error: missing required parameter 'workers'");
    }

    #[test]
    fn rejects_non_object() {
        let cfg = json!([1, 2]);
        assert!(decode_config(Some(&cfg), &params(), &DecodeChain::new()).is_err());
    }

    #[test]
    fn type_errors_name_the_parameter() {
        let cfg = json!({ "workers": "four" });
        let err = decode_config(Some(&cfg), &params(), &DecodeChain::new()).unwrap_err();
        assert_eq!(err.to_string(), "config error: parameter 'workers': expected integer");
    }

    #[test]
    fn encode_preserves_order() {
        let mut values = ConfigValues::new();
        values.set("workers", ParamValue::U64(2));
        values.set("label", ParamValue::Str("edge".into()));
        values.set("workers", ParamValue::U64(3));

        let out = encode_config(&values, &EncodeChain::new()).unwrap();
        assert_eq!(out, json!({ "workers": 3, "label": "edge" }));
        let keys: Vec<&str> = out
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["workers", "label"]);
    }

    #[test]
    fn rich_getters_match_variant() {
        let mut values = ConfigValues::new();
        values.set("timeout", ParamValue::Duration(TimeDelta::seconds(5)));
        values.set("bind", ParamValue::Ip(IpAddr::from([0, 0, 0, 0])));

        assert_eq!(values.get_duration("timeout"), Some(TimeDelta::seconds(5)));
        assert_eq!(values.get_ip("bind"), Some(IpAddr::from([0, 0, 0, 0])));
        assert_eq!(values.get_timestamp("timeout"), None);
        assert_eq!(values.get_i64("bind"), None);
    }
}
