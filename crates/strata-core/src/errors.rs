//! Unified error type for the composition engine
//!
//! Dispatch failures are raised synchronously at the call site of the entry
//! point (or of the `next` call that exhausted the chain). Nothing is retried
//! internally.

/// Error type for every Strata operation
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    /// Method name is not a legal identifier
    #[error("Invalid method name: {name:?}")]
    InvalidMethodName {
        /// The rejected name
        name: String,
    },

    /// Entry point requested for a name the registry never defined
    #[error("Method '{method}' is not defined")]
    UndefinedMethod {
        /// Requested method name
        method: String,
    },

    /// Method invoked on an object with zero installed layers
    #[error("No layers installed (invoking '{method}')")]
    NoLayers {
        /// Method being invoked
        method: String,
    },

    /// Chain exhausted without finding an implementation
    #[error("Method '{method}' is not implemented by any remaining layer")]
    MethodNotImplemented {
        /// Method being invoked
        method: String,
    },

    /// Object invoked as a function without a reachable `$call`
    #[error("Call not supported: {reason}")]
    CallNotSupported {
        /// Why the call could not be dispatched
        reason: String,
    },

    /// Layer factory refused to produce an implementation
    #[error("Layer factory failed: {message}")]
    Factory {
        /// Message from the factory
        message: String,
    },

    /// Error produced by a layer implementation
    #[error("Layer failed in '{method}'")]
    Layer {
        /// Method whose implementation failed
        method: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StrataError {
    /// Create an invalid method name error
    pub fn invalid_method_name(name: impl Into<String>) -> Self {
        Self::InvalidMethodName { name: name.into() }
    }

    /// Create an undefined method error
    pub fn undefined_method(method: impl Into<String>) -> Self {
        Self::UndefinedMethod {
            method: method.into(),
        }
    }

    /// Create a no layers error
    pub fn no_layers(method: impl Into<String>) -> Self {
        Self::NoLayers {
            method: method.into(),
        }
    }

    /// Create a method not implemented error
    pub fn method_not_implemented(method: impl Into<String>) -> Self {
        Self::MethodNotImplemented {
            method: method.into(),
        }
    }

    /// Create a call not supported error
    pub fn call_not_supported(reason: impl Into<String>) -> Self {
        Self::CallNotSupported {
            reason: reason.into(),
        }
    }

    /// Create a factory error
    pub fn factory(message: impl Into<String>) -> Self {
        Self::Factory {
            message: message.into(),
        }
    }

    /// Wrap an error raised inside a layer implementation
    pub fn layer(
        method: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Layer {
            method: method.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error reports an exhausted chain (`NoLayers` or
    /// `MethodNotImplemented`), the two conditions lenient mode suppresses
    pub fn is_exhausted_chain(&self) -> bool {
        matches!(
            self,
            Self::NoLayers { .. } | Self::MethodNotImplemented { .. }
        )
    }
}

/// Standard Result type for Strata operations
pub type Result<T> = std::result::Result<T, StrataError>;
