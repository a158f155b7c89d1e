//! Error types for the crate's outer boundaries.
//!
//! Forecasting itself never fails: malformed metadata, missing peers, and
//! incompatible work-units all degrade to a partial schedule. Errors only
//! arise when decoding external input or accepting configuration.

use thiserror::Error;

/// Errors raised while decoding snapshots or validating configuration.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The queue snapshot or config payload is not valid JSON for its type.
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ForecastError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = ForecastError::invalid_config("zoom_step", "must be positive");
        assert_eq!(err.to_string(), "invalid config `zoom_step`: must be positive");
    }

    #[test]
    fn test_decode_from_serde() {
        let parse: Result<u32, _> = serde_json::from_str("not json");
        let err: ForecastError = parse.unwrap_err().into();
        assert!(matches!(err, ForecastError::Decode(_)));
        assert!(err.to_string().starts_with("malformed payload"));
    }
}
