//! Error types for TalentBot.

use std::time::Duration;

use uuid::Uuid;

/// Error from a service call that both looks up a session and exports it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {after:?}")]
    Timeout { provider: String, after: Duration },
}

/// Sentiment classifier errors.
#[derive(Debug, thiserror::Error)]
pub enum SentimentError {
    #[error("Classifier call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Unrecognized sentiment label: {0}")]
    UnknownLabel(String),

    #[error("Could not parse classifier output: {0}")]
    Unparseable(String),
}

/// Session registry errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {id} not found")]
    NotFound { id: Uuid },

    #[error("Session {id} has not completed the assessment")]
    Incomplete { id: Uuid },
}

/// Report export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("PDF conversion failed: {0}")]
    PdfConversionFailed(String),

    #[error("Conversion timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error during export: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_piece() {
        let id = Uuid::nil();
        let err = Error::from(SessionError::NotFound { id });
        assert_eq!(err.to_string(), format!("Session error: Session {id} not found"));

        let err = Error::from(ExportError::Timeout(30));
        assert_eq!(err.to_string(), "Export error: Conversion timed out after 30 seconds");

        let err = SentimentError::from(LlmError::Timeout {
            provider: "sentiment_analyzer".into(),
            after: Duration::from_secs(2),
        });
        assert_eq!(
            err.to_string(),
            "Classifier call failed: Provider sentiment_analyzer timed out after 2s"
        );

        let err = ConfigError::InvalidValue {
            key: "TALENTBOT_HTTP_PORT".into(),
            message: "not a port".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for TALENTBOT_HTTP_PORT: not a port"
        );
    }
}
