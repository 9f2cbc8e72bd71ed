//! Error types for the digest pipeline.
//!
//! One enum per collaborator so the coordinator can tell which failures end
//! a run and which are folded into the digest body.

use thiserror::Error;

/// Errors reaching or reading the timeline source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The timeline API answered with a non-success status
    #[error("Timeline API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not JSON at all
    #[error("Failed to decode timeline response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors turning a timeline record into HTML.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A record did not match the post shape
    #[error("post #{index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The response body was JSON but not a list of posts
    #[error("expected a list of posts, got {found}")]
    NotAList { found: &'static str },

    /// A field the renderer dereferences was empty
    #[error("post {id} is missing {field}")]
    MissingField { id: String, field: &'static str },
}

/// Errors delivering the digest email.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Sender or recipient address could not be parsed
    #[error("Invalid email address {address:?}: {reason}")]
    Address { address: String, reason: String },

    /// The message could not be assembled
    #[error("Failed to build email message: {0}")]
    Message(#[from] lettre::error::Error),

    /// The SMTP transport rejected or failed the send
    #[error("Failed to send email via SMTP: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Errors reading or writing the persisted cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    /// Filesystem error
    #[error("Cursor storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored state could not be (de)serialized
    #[error("Cursor state is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable is unset or empty
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// Variable is set but unusable
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// A run that ended without completing.
///
/// Render failures never appear here; they become the digest body.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("timeline fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("digest dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("cursor store failed: {0}")]
    Cursor(#[from] CursorError),
}
