//! Twitter timeline digest.
//!
//! This crate provides:
//! - An OAuth 1.0a signed client for the home timeline
//! - HTML rendering of posts, retweets, quotes and attachments
//! - A digest email sent over SMTP
//! - A persisted cursor so each run only mails posts not seen before
//! - A secret-gated HTTP trigger for scheduled runs

pub mod config;
pub mod cursor;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod twitter;

// Re-export main types
pub use config::DigestConfig;
pub use cursor::{CursorStore, FileCursorStore, MemoryCursorStore};
pub use digest::{build_digest, DigestEmail, MailDispatcher, SmtpMailer};
pub use error::{CursorError, DispatchError, FetchError, PipelineError, RenderError};
pub use pipeline::{Pipeline, RunReport, RunStatus};
pub use render::render_post;
pub use twitter::{Post, TimelineQuery, TimelineSource, TwitterClient};
