//! Hand-written collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use timeline_digest::cursor::MemoryCursorStore;
use timeline_digest::digest::{DigestEmail, MailDispatcher};
use timeline_digest::error::{DispatchError, FetchError};
use timeline_digest::pipeline::Pipeline;
use timeline_digest::twitter::{TimelineQuery, TimelineSource};
use tokio::sync::Mutex;

/// Canned answer for the fake timeline.
pub enum Reply {
    Posts(Vec<Value>),
    /// A 2xx body of any shape.
    Body(Value),
    Status(u16),
}

/// Timeline that replays a reply and records every query.
pub struct FakeTimeline {
    reply: Mutex<Reply>,
    pub queries: Mutex<Vec<TimelineQuery>>,
}

impl FakeTimeline {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub async fn set_reply(&self, reply: Reply) {
        *self.reply.lock().await = reply;
    }
}

#[async_trait]
impl TimelineSource for FakeTimeline {
    async fn fetch_timeline(&self, query: &TimelineQuery) -> Result<Value, FetchError> {
        self.queries.lock().await.push(query.clone());
        match &*self.reply.lock().await {
            Reply::Posts(posts) => Ok(Value::Array(posts.clone())),
            Reply::Body(body) => Ok(body.clone()),
            Reply::Status(status) => Err(FetchError::Status {
                status: *status,
                body: "Over capacity".to_string(),
            }),
        }
    }
}

/// Mailer that keeps every message, optionally refusing them.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<DigestEmail>>,
    fail: Mutex<bool>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn set_failing(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }
}

#[async_trait]
impl MailDispatcher for RecordingMailer {
    async fn send(&self, email: &DigestEmail) -> Result<(), DispatchError> {
        if *self.fail.lock().await {
            return Err(DispatchError::Address {
                address: email.to.clone(),
                reason: "relay refused".to_string(),
            });
        }
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}

pub fn post(id: &str, text: &str) -> Value {
    json!({
        "id_str": id,
        "full_text": text,
        "user": {
            "name": "Jack",
            "screen_name": "jack",
            "profile_image_url_https": "https://pbs.twimg.com/profile_images/jack.png"
        },
        "entities": { "user_mentions": [], "urls": [] }
    })
}

pub fn pipeline(
    timeline: &Arc<FakeTimeline>,
    mailer: &Arc<RecordingMailer>,
    cursor: Arc<MemoryCursorStore>,
) -> Pipeline {
    Pipeline::new(
        timeline.clone(),
        mailer.clone(),
        cursor,
        "reader@example.com",
        "bot@example.com",
    )
}
