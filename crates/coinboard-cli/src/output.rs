use std::io::Write;

use coinboard_core::{FetchError, RetryConfig};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;
use crate::metadata::Metadata;

/// Structured error entry in the output envelope.
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&FetchError> for EnvelopeError {
    fn from(error: &FetchError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
            retryable: RetryConfig::default().is_transient(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub meta: Metadata,
    pub data: Value,
    pub errors: Vec<EnvelopeError>,
}

pub fn render(envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{payload}")?;
    Ok(())
}
