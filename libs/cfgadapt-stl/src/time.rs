use serde_json::Value;

use cfgadapt_api::adapter::{DecodeAdapter, EncodeAdapter};
use cfgadapt_api::error::AdaptError;
use cfgadapt_api::value::{ParamType, ParamValue};

use crate::layout::Layout;

/// Decodes a config string into `ParamValue::Timestamp` using a fixed layout.
#[derive(Debug, Clone)]
pub struct StringToTime {
    layout: Layout,
}

impl StringToTime {
    pub fn new(layout: &str) -> Self {
        Self {
            layout: Layout::new(layout),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

impl DecodeAdapter for StringToTime {
    fn decode(&self, from: &Value, to: ParamType) -> Result<ParamValue, AdaptError> {
        match (from, to) {
            (Value::String(s), ParamType::Timestamp) => self
                .layout
                .parse(s)
                .map(ParamValue::Timestamp)
                .map_err(AdaptError::conversion),
            _ => Err(AdaptError::NotApplicable),
        }
    }
}

/// Encodes `ParamValue::Timestamp` as a string in a fixed layout.
#[derive(Debug, Clone)]
pub struct TimeToCfg {
    layout: Layout,
}

impl TimeToCfg {
    pub fn new(layout: &str) -> Self {
        Self {
            layout: Layout::new(layout),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

impl EncodeAdapter for TimeToCfg {
    fn encode(&self, from: &ParamValue) -> Result<Value, AdaptError> {
        match from {
            ParamValue::Timestamp(t) => self
                .layout
                .format(t)
                .map(Value::String)
                .map_err(AdaptError::conversion),
            _ => Err(AdaptError::NotApplicable),
        }
    }
}
