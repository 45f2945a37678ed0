use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::AdaptError;
use crate::value::{ParamType, ParamValue};

/// Config → typed conversion for one type pattern.
///
/// Contract: return `Err(AdaptError::NotApplicable)` if and only if `(from, to)`
/// is not this adapter's pattern. A matched pattern with a malformed value is
/// `AdaptError::Conversion`, never a decline.
pub trait DecodeAdapter: Send + Sync {
    fn decode(&self, from: &Value, to: ParamType) -> Result<ParamValue, AdaptError>;
}

/// Typed → config conversion for one type pattern. Same decline contract as
/// [`DecodeAdapter`].
pub trait EncodeAdapter: Send + Sync {
    fn encode(&self, from: &ParamValue) -> Result<Value, AdaptError>;
}

impl<F> DecodeAdapter for F
where
    F: Fn(&Value, ParamType) -> Result<ParamValue, AdaptError> + Send + Sync,
{
    fn decode(&self, from: &Value, to: ParamType) -> Result<ParamValue, AdaptError> {
        self(from, to)
    }
}

impl<F> EncodeAdapter for F
where
    F: Fn(&ParamValue) -> Result<Value, AdaptError> + Send + Sync,
{
    fn encode(&self, from: &ParamValue) -> Result<Value, AdaptError> {
        self(from)
    }
}

/// A named decode adapter, ready for registration in a [`DecodeChain`].
///
/// The name is for diagnostics only.
///
/// [`DecodeChain`]: crate::chain::DecodeChain
#[derive(Clone)]
pub struct FromCfg {
    name: &'static str,
    adapter: Arc<dyn DecodeAdapter>,
}

impl FromCfg {
    pub fn new(name: &'static str, adapter: impl DecodeAdapter + 'static) -> Self {
        Self {
            name,
            adapter: Arc::new(adapter),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn decode(&self, from: &Value, to: ParamType) -> Result<ParamValue, AdaptError> {
        self.adapter.decode(from, to)
    }
}

impl fmt::Debug for FromCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromCfg").field("name", &self.name).finish()
    }
}

/// A named encode adapter, ready for registration in an [`EncodeChain`].
///
/// [`EncodeChain`]: crate::chain::EncodeChain
#[derive(Clone)]
pub struct ToCfg {
    name: &'static str,
    adapter: Arc<dyn EncodeAdapter>,
}

impl ToCfg {
    pub fn new(name: &'static str, adapter: impl EncodeAdapter + 'static) -> Self {
        Self {
            name,
            adapter: Arc::new(adapter),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn encode(&self, from: &ParamValue) -> Result<Value, AdaptError> {
        self.adapter.encode(from)
    }
}

impl fmt::Debug for ToCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToCfg").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(from: &Value, to: ParamType) -> Result<ParamValue, AdaptError> {
        match (from, to) {
            (Value::String(s), ParamType::Str) => Ok(ParamValue::Str(s.to_uppercase())),
            _ => Err(AdaptError::NotApplicable),
        }
    }

    #[test]
    fn closures_register_as_adapters() {
        let a = FromCfg::new("upper", upper);
        assert_eq!(a.name(), "upper");
        assert_eq!(
            a.decode(&Value::from("abc"), ParamType::Str).unwrap(),
            ParamValue::Str("ABC".into())
        );
        assert!(a.decode(&Value::from(1), ParamType::Str).unwrap_err().is_not_applicable());

        let b = ToCfg::new("bool_to_yes", |v: &ParamValue| match v {
            ParamValue::Bool(true) => Ok(Value::from("yes")),
            _ => Err(AdaptError::NotApplicable),
        });
        assert_eq!(b.encode(&ParamValue::Bool(true)).unwrap(), Value::from("yes"));
        assert!(b.encode(&ParamValue::Bool(false)).unwrap_err().is_not_applicable());
    }

    #[test]
    fn debug_shows_name_only() {
        let a = FromCfg::new("upper", upper);
        assert_eq!(format!("{a:?}"), "FromCfg { name: \"upper\" }");
    }
}
