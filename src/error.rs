//! Configuration error types.
//!
//! Only configuration can fail. Everything the sink does per deposit is a
//! deterministic skip-or-accumulate decision and never produces an error.

use thiserror::Error;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort sink construction.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No anode plane could be resolved.
    #[error("DepoSimChannelSink requires an anode plane: '{0}' not found")]
    MissingAnode(String),

    /// The random source could not be resolved.
    #[error("DepoSimChannelSink requires a random source: '{0}' not found")]
    MissingRandom(String),

    /// A value is out of its allowed range.
    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid {
        /// Configuration key.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[cfg(feature = "serde")]
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_dependency() {
        let e = ConfigError::MissingAnode(String::new());
        assert!(e.to_string().contains("anode plane"));
        let e = ConfigError::MissingRandom("Random".into());
        assert!(e.to_string().contains("random source: 'Random'"));
        let e = ConfigError::Invalid { field: "tick", reason: "must be positive".into() };
        assert_eq!(e.to_string(), "invalid configuration value for `tick`: must be positive");
    }
}
