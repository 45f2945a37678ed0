pub mod adapter;
pub mod chain;
pub mod config;

pub use cfgadapt_api_derive::ConfigParams;
pub mod error;
pub mod value;

pub use adapter::{DecodeAdapter, EncodeAdapter, FromCfg, ToCfg};
pub use chain::{DecodeChain, EncodeChain};
pub use config::{ConfigParam, ConfigValues, decode_config, encode_config};
pub use error::{AdaptError, ConfigError};
pub use value::{ParamType, ParamValue};
