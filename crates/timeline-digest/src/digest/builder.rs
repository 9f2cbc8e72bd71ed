//! Digest document builder.
//!
//! Assembles the rendered posts of one fetch into the email body.

use serde::Deserialize;
use serde_json::Value;

use crate::error::RenderError;
use crate::render::render_post;
use crate::twitter::Post;

/// Body sent when the fetch returned nothing new.
pub const EMPTY_DIGEST: &str = "There were no new tweets in your timeline since the last email.";

/// Build the digest for a batch of raw timeline records, newest first.
///
/// Never fails: a record that cannot be decoded or rendered replaces the
/// whole body with an error notice, which is still worth mailing.
#[must_use]
pub fn build_digest(records: &[Value]) -> String {
    try_build_digest(records).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Timeline records could not be rendered");
        error_digest(&e)
    })
}

/// Build the digest, surfacing the first record that fails.
pub fn try_build_digest(records: &[Value]) -> Result<String, RenderError> {
    if records.is_empty() {
        return Ok(EMPTY_DIGEST.to_string());
    }

    let mut html = count_header(records.len());
    for (index, record) in records.iter().enumerate() {
        let post = Post::deserialize(record)
            .map_err(|source| RenderError::Malformed { index, source })?;
        html.push_str(&render_post(&post, true)?);
    }

    tracing::debug!(posts = records.len(), bytes = html.len(), "Built digest");
    Ok(html)
}

/// The post records of a raw timeline response.
///
/// Anything other than an array (an API error object, for instance) is a
/// malformed feed.
pub fn timeline_records(body: &Value) -> Result<&[Value], RenderError> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(_) => Err(RenderError::NotAList { found: "an object" }),
        Value::String(_) => Err(RenderError::NotAList { found: "a string" }),
        Value::Number(_) => Err(RenderError::NotAList { found: "a number" }),
        Value::Bool(_) => Err(RenderError::NotAList { found: "a boolean" }),
        Value::Null => Err(RenderError::NotAList { found: "null" }),
    }
}

/// The error notice used in place of the digest body.
#[must_use]
pub fn error_digest(error: &RenderError) -> String {
    format!("There was an error parsing twitter’s json response: {error}")
}

/// Cursor candidate for a batch: the ID of its first (newest) record.
///
/// Prefers `id_str`; the numeric `id` is only used when the string form is
/// missing, since large IDs lose precision as JSON numbers in some producers.
#[must_use]
pub fn newest_post_id(records: &[Value]) -> Option<String> {
    let first = records.first()?;
    match first.get("id_str").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Some(id.to_string()),
        _ => first.get("id").and_then(Value::as_u64).map(|id| id.to_string()),
    }
}

fn count_header(count: usize) -> String {
    let noun = if count == 1 { "tweet" } else { "tweets" };
    format!("<p>✨ {count} new {noun}</p>")
}
