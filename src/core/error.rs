//! Error types for verb resolution.

use thiserror::Error;

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while registering plugins or resolving verbs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Plugin-local recognition errors
    #[error("Verb '{verb}' is not recognized by plugin '{plugin}'")]
    VerbNotRecognized { verb: String, plugin: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Registry errors
    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Invalid plugin definition: {0}")]
    InvalidPlugin(String),

    // Configuration errors
    #[error("Fuzzy threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Whether the caller can recover locally, e.g. by trying the next plugin.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::VerbNotRecognized { .. } | Error::InvalidInput(_) | Error::PluginNotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_not_recognized_message() {
        let err = Error::VerbNotRecognized {
            verb: "frobnicate".to_string(),
            plugin: "file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Verb 'frobnicate' is not recognized by plugin 'file'"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_errors_not_recoverable() {
        assert!(!Error::InvalidThreshold(1.5).is_recoverable());
        assert!(!Error::InvalidPlugin("empty name".into()).is_recoverable());
    }

    #[test]
    fn test_from_serde_json() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
