//! Twitter timeline access.
//!
//! Provides the post model and a signed client for the timeline API.

mod client;
mod oauth;
mod types;

#[cfg(test)]
pub use client::MockTimelineSource;
pub use client::{
    TimelineQuery, TimelineSource, TwitterClient, DEFAULT_TIMELINE_URL, MAX_PAGE_SIZE,
};
pub use oauth::{Nonce, OAuthCredentials};
pub use types::{Author, Entities, ExtendedEntities, Link, MediaEntity, Mention, Post};
