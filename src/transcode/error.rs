// Transcode error kinds

use std::io;
use std::time::Duration;

use super::identifier::IdentifierError;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("missing form field `{0}`")]
    MissingField(String),

    #[error("failed to start transcoder: {0}")]
    Spawn(#[source] io::Error),

    #[error("transcoder timed out after {}s", .after.as_secs())]
    Timeout {
        command: String,
        after: Duration,
        partial: Vec<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
