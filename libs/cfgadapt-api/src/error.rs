/// Boxed source error carried by a failed conversion.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of an adapter call that did not produce a value.
///
/// `NotApplicable` is a control-flow signal, not a failure: the adapter's type
/// pattern did not match and the caller should try the next one.
/// `Conversion` means the pattern matched but the value was malformed.
#[derive(Debug, thiserror::Error)]
pub enum AdaptError {
    #[error("adapter not applicable")]
    NotApplicable,

    #[error("{source}")]
    Conversion {
        #[source]
        source: BoxError,
    },
}

impl AdaptError {
    pub fn conversion(source: impl Into<BoxError>) -> Self {
        Self::Conversion {
            source: source.into(),
        }
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable)
    }
}

/// Error produced while decoding or encoding a configuration object.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Config(String),

    #[error("adapter '{adapter}' failed: {source}")]
    Adapter {
        adapter: &'static str,
        #[source]
        source: AdaptError,
    },
}

impl ConfigError {
    /// Add context to the error.
    ///
    /// For `Config`, context is prepended to the message.
    /// For `Adapter`, the error is flattened into a `Config` message with the
    /// context and adapter name, so the outermost message reads left to right.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            ConfigError::Config(msg) => ConfigError::Config(format!("{ctx}: {msg}")),
            ConfigError::Adapter { adapter, source } => {
                ConfigError::Config(format!("{ctx}: adapter '{adapter}' failed: {source}"))
            }
        }
    }
}
