use thiserror::Error;

use crate::timestamp::TimestampError;

#[derive(Error, Debug)]
pub enum CourtsideError {
    #[error("Malformed timestamp on {shot}: {source}")]
    MalformedTimestamp {
        shot: String,
        #[source]
        source: TimestampError,
    },

    #[error("Invalid analysis result: {reason}")]
    InvalidAnalysis { reason: String },

    #[error("Invalid upload {name}: {reason}")]
    InvalidUpload { name: String, reason: String },

    #[error("Playback failed: {reason}")]
    Playback { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Analysis request failed: {reason}")]
    ReportFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CourtsideError>;
