// src/ingest/error.rs
//! Error types for the ingestion pipeline

use thiserror::Error;

/// Failure of a whole feed fetch. Absorbed at the fetcher boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failed (DNS, connect, timeout, body read)
    #[error("request failed: {0}")]
    Transport(String),

    /// Remote answered with a non-success status
    #[error("http status {status} for {url}")]
    Status { status: u16, url: String },

    /// Document is neither RSS nor Atom
    #[error("parse error: {0}")]
    Parse(String),

    /// Feed URL could not be parsed
    #[error("invalid url `{0}`")]
    InvalidUrl(String),
}

/// Failure of a single entry. The fetcher skips the entry and continues.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("entry has no usable title")]
    EmptyTitle,
}
