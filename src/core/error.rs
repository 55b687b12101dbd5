//! Error types for the training driver

use thiserror::Error;

/// Errors raised while turning command-line tokens into training options
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Option {0} requires a value")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Invalid value for option {option}: {value}")]
    InvalidNumber { option: String, value: String },

    #[error("NaN or Infinity in input")]
    NonFinite(String),

    #[error("n-fold cross validation: n must >= 2 (got {0})")]
    FoldCount(i64),

    #[error("Missing training set file")]
    MissingInputFile,

    #[error("unknown svm type: {0}")]
    UnknownSvmType(i32),

    #[error("unknown kernel type: {0}")]
    UnknownKernelType(i32),

    #[error("Option {option} must be 0 or 1, got {value}")]
    InvalidFlag { option: String, value: i32 },
}

impl ConfigError {
    /// Whether the usage text should accompany this error
    ///
    /// Non-finite numbers are reported as plain parse errors; everything else
    /// is a malformed invocation.
    pub fn shows_usage(&self) -> bool {
        !matches!(self, ConfigError::NonFinite(_))
    }
}

#[derive(Error, Debug)]
pub enum SVMError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, SVMError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_classification() {
        assert!(ConfigError::UnknownOption("-z".to_string()).shows_usage());
        assert!(ConfigError::FoldCount(1).shows_usage());
        assert!(ConfigError::MissingInputFile.shows_usage());
        assert!(!ConfigError::NonFinite("nan".to_string()).shows_usage());
    }

    #[test]
    fn test_fold_count_message_mentions_minimum() {
        let msg = ConfigError::FoldCount(1).to_string();
        assert!(msg.contains("n must >= 2"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: SVMError = ConfigError::MissingInputFile.into();
        assert!(matches!(err, SVMError::Config(ConfigError::MissingInputFile)));
        assert_eq!(err.to_string(), "Missing training set file");
    }
}
