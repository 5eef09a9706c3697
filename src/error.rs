// src/error.rs
//! Error taxonomy for a single run.
//!
//! Only `SourceUnavailable` (and a dedup state that cannot be read) abort a run.
//! Sink and persistence-write failures are reported per item / per run and the
//! pipeline keeps going.

use std::path::PathBuf;

use thiserror::Error;

/// Transport, auth or decode failure while talking to the item source.
#[derive(Debug, Clone, Error)]
#[error("source unavailable (status {status:?}): {message}")]
pub struct SourceUnavailable {
    pub status: Option<u16>,
    pub message: String,
}

impl SourceUnavailable {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: body.into(),
        }
    }
}

impl From<reqwest::Error> for SourceUnavailable {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// A single notification was not delivered.
#[derive(Debug, Clone, Error)]
#[error("sink rejected delivery (status {status:?}): {body}")]
pub struct SinkError {
    pub status: Option<u16>,
    pub body: String,
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

/// Reading or writing the dedup state file failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("dedup state I/O at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dedup state at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding dedup state for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Why `Pipeline::run` gave up before producing a report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceUnavailable),

    #[error("could not load dedup state: {0}")]
    DedupLoad(#[from] PersistenceError),
}
