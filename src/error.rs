//! Errors that abort a load cycle.
//!
//! A missing or unusable metric is never an error; it is carried as
//! [`crate::metric::Metric::NoData`].

use serde_json::error::Category;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("fetch failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("fetch failed: HTTP status {status}")]
    Status { status: u16 },

    /// The body is not JSON at all.
    #[error("payload is not valid JSON: {0}")]
    Syntax(String),

    /// The body is JSON but not an object of orchestrators.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("cannot read payload file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A consumer asked for a KPI projection that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {family} key {key:?}")]
pub struct UnknownKey {
    pub family: &'static str,
    pub key: String,
}

impl LoadError {
    pub(crate) fn from_decode(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => LoadError::MalformedPayload(format!(
                "expected an object keyed by orchestrator id: {}",
                err
            )),
            Category::Syntax | Category::Eof | Category::Io => LoadError::Syntax(err.to_string()),
        }
    }

    /// Short machine-friendly tag for log records.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Transport(_) => "transport",
            LoadError::Status { .. } => "status",
            LoadError::Syntax(_) => "syntax",
            LoadError::MalformedPayload(_) => "malformed_payload",
            LoadError::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_classification() {
        let data_err = serde_json::from_str::<Vec<u8>>("{}").unwrap_err();
        assert_eq!(LoadError::from_decode(data_err).kind(), "malformed_payload");

        let syntax_err = serde_json::from_str::<Vec<u8>>("[,").unwrap_err();
        assert_eq!(LoadError::from_decode(syntax_err).kind(), "syntax");

        let eof_err = serde_json::from_str::<Vec<u8>>("[1,").unwrap_err();
        assert_eq!(LoadError::from_decode(eof_err).kind(), "syntax");
    }

    #[test]
    fn test_status_message() {
        let err = LoadError::Status { status: 503 };
        assert_eq!(err.to_string(), "fetch failed: HTTP status 503");
    }
}
