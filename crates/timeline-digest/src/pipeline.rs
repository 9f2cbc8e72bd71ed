//! Digest pipeline: read cursor, fetch, build, dispatch, advance cursor.
//!
//! A run is strictly sequential and never retries. The cursor only moves
//! after the relay accepted a non-empty digest, and never moves backwards, so
//! a failed run re-sends the same posts next time.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::cursor::{is_newer, CursorStore};
use crate::digest::{
    digest_subject, error_digest, newest_post_id, timeline_records, try_build_digest, DigestEmail,
    MailDispatcher,
};
use crate::error::PipelineError;
use crate::twitter::{TimelineQuery, TimelineSource};

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// A digest with at least one post (or an error notice) was sent.
    Sent,
    /// Nothing new; the "no new tweets" notice was sent.
    Empty,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Posts included in the digest.
    pub posts: usize,
    /// Cursor after the run.
    pub cursor: Option<String>,
    /// Human-readable summary.
    pub detail: String,
}

/// Digest pipeline over injected collaborators.
pub struct Pipeline {
    source: Arc<dyn TimelineSource>,
    mailer: Arc<dyn MailDispatcher>,
    cursor: Arc<dyn CursorStore>,
    to: String,
    from: String,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl Pipeline {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(
        source: Arc<dyn TimelineSource>,
        mailer: Arc<dyn MailDispatcher>,
        cursor: Arc<dyn CursorStore>,
        to: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            source,
            mailer,
            cursor,
            to: to.into(),
            from: from.into(),
            today: local_today,
        }
    }

    /// Use a fixed date for the subject line.
    #[must_use]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run one fetch-render-dispatch-persist cycle.
    pub async fn run_once(&self) -> Result<RunReport, PipelineError> {
        let last = self.cursor.read_cursor().await?;
        tracing::info!(cursor = ?last, "Starting digest run");

        let query = TimelineQuery::since(last.clone());
        let body = self
            .source
            .fetch_timeline(&query)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, "Timeline fetch failed, cursor left untouched");
            })?;

        let (html, render_error) = match timeline_records(&body).and_then(try_build_digest) {
            Ok(html) => (html, None),
            Err(e) => {
                tracing::warn!(error = %e, "Sending error digest instead");
                (error_digest(&e), Some(e.to_string()))
            }
        };

        let email = DigestEmail {
            to: self.to.clone(),
            from: self.from.clone(),
            subject: digest_subject((self.today)()),
            html,
        };

        self.mailer
            .send(&email)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, "Digest dispatch failed, cursor left untouched");
            })?;

        let records = timeline_records(&body).unwrap_or_default();
        if records.is_empty() && render_error.is_none() {
            tracing::info!("No new posts, cursor unchanged");
            return Ok(RunReport {
                status: RunStatus::Empty,
                posts: 0,
                cursor: last,
                detail: "no new posts".to_string(),
            });
        }

        let newest = match newest_post_id(records) {
            Some(id) if is_newer(&id, last.as_deref()) => {
                self.cursor.write_cursor(&id).await?;
                Some(id)
            }
            Some(id) => {
                tracing::warn!(
                    candidate = %id,
                    cursor = ?last,
                    "Newest record is not past the cursor, cursor unchanged"
                );
                None
            }
            None => {
                tracing::warn!("No post id in response, cursor unchanged");
                None
            }
        };

        let detail = match render_error {
            Some(e) => format!("sent error digest: {e}"),
            None => format!("sent {} posts", records.len()),
        };

        tracing::info!(
            posts = records.len(),
            cursor = ?newest,
            "Digest run complete"
        );

        Ok(RunReport {
            status: RunStatus::Sent,
            posts: records.len(),
            cursor: newest.or(last),
            detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MockCursorStore;
    use crate::digest::{MockMailDispatcher, EMPTY_DIGEST};
    use crate::error::{CursorError, DispatchError, FetchError};
    use crate::twitter::MockTimelineSource;
    use serde_json::json;

    fn fixed_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn pipeline(
        source: MockTimelineSource,
        mailer: MockMailDispatcher,
        cursor: MockCursorStore,
    ) -> Pipeline {
        Pipeline::new(
            Arc::new(source),
            Arc::new(mailer),
            Arc::new(cursor),
            "reader@example.com",
            "bot@example.com",
        )
        .with_clock(fixed_day)
    }

    fn post(id: &str) -> serde_json::Value {
        json!({
            "id_str": id,
            "full_text": format!("post {id}"),
            "user": { "name": "A", "screen_name": "a" },
        })
    }

    #[tokio::test]
    async fn test_sends_and_advances_cursor() {
        let mut cursor = MockCursorStore::new();
        cursor
            .expect_read_cursor()
            .returning(|| Ok(Some("1000".to_string())));
        cursor
            .expect_write_cursor()
            .withf(|id| id == "1100")
            .times(1)
            .returning(|_| Ok(()));

        let mut source = MockTimelineSource::new();
        source
            .expect_fetch_timeline()
            .withf(|q| q.since_id.as_deref() == Some("1000") && q.count == 200)
            .returning(|_| Ok(json!([post("1100"), post("1050")])));

        let mut mailer = MockMailDispatcher::new();
        mailer
            .expect_send()
            .withf(|email| {
                email.subject == "Today on Twitter 09.03.2024"
                    && email.html.starts_with("<p>✨ 2 new tweets</p>")
            })
            .times(1)
            .returning(|_| Ok(()));

        let report = pipeline(source, mailer, cursor).run_once().await.unwrap();
        assert_eq!(report.status, RunStatus::Sent);
        assert_eq!(report.posts, 2);
        assert_eq!(report.cursor.as_deref(), Some("1100"));
    }

    #[tokio::test]
    async fn test_empty_batch_keeps_cursor() {
        let mut cursor = MockCursorStore::new();
        cursor
            .expect_read_cursor()
            .returning(|| Ok(Some("1000".to_string())));
        cursor.expect_write_cursor().never();

        let mut source = MockTimelineSource::new();
        source.expect_fetch_timeline().returning(|_| Ok(json!([])));

        let mut mailer = MockMailDispatcher::new();
        mailer
            .expect_send()
            .withf(|email| email.html == EMPTY_DIGEST)
            .times(1)
            .returning(|_| Ok(()));

        let report = pipeline(source, mailer, cursor).run_once().await.unwrap();
        assert_eq!(report.status, RunStatus::Empty);
        assert_eq!(report.cursor.as_deref(), Some("1000"));
    }

    #[tokio::test]
    async fn test_fetch_failure_sends_nothing() {
        let mut cursor = MockCursorStore::new();
        cursor.expect_read_cursor().returning(|| Ok(None));
        cursor.expect_write_cursor().never();

        let mut source = MockTimelineSource::new();
        source.expect_fetch_timeline().returning(|_| {
            Err(FetchError::Status {
                status: 401,
                body: "Could not authenticate you.".to_string(),
            })
        });

        let mut mailer = MockMailDispatcher::new();
        mailer.expect_send().never();

        let err = pipeline(source, mailer, cursor).run_once().await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(FetchError::Status { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_cursor() {
        let mut cursor = MockCursorStore::new();
        cursor.expect_read_cursor().returning(|| Ok(None));
        cursor.expect_write_cursor().never();

        let mut source = MockTimelineSource::new();
        source
            .expect_fetch_timeline()
            .withf(|q| q.since_id.is_none())
            .returning(|_| Ok(json!([post("100")])));

        let mut mailer = MockMailDispatcher::new();
        mailer.expect_send().returning(|_| {
            Err(DispatchError::Address {
                address: "x".to_string(),
                reason: "invalid".to_string(),
            })
        });

        let err = pipeline(source, mailer, cursor).run_once().await.unwrap_err();
        assert!(matches!(err, PipelineError::Dispatch(_)));
    }

    #[tokio::test]
    async fn test_malformed_batch_sends_error_digest() {
        let mut cursor = MockCursorStore::new();
        cursor.expect_read_cursor().returning(|| Ok(None));
        cursor
            .expect_write_cursor()
            .withf(|id| id == "300")
            .times(1)
            .returning(|_| Ok(()));

        let mut source = MockTimelineSource::new();
        source
            .expect_fetch_timeline()
            .returning(|_| Ok(json!([{ "id_str": "300" }])));

        let mut mailer = MockMailDispatcher::new();
        mailer
            .expect_send()
            .withf(|email| {
                email
                    .html
                    .starts_with("There was an error parsing twitter’s json response: ")
            })
            .times(1)
            .returning(|_| Ok(()));

        let report = pipeline(source, mailer, cursor).run_once().await.unwrap();
        assert_eq!(report.status, RunStatus::Sent);
        assert!(report.detail.starts_with("sent error digest"));
    }

    #[tokio::test]
    async fn test_error_object_body_sends_error_digest() {
        let mut cursor = MockCursorStore::new();
        cursor
            .expect_read_cursor()
            .returning(|| Ok(Some("1000".to_string())));
        cursor.expect_write_cursor().never();

        let mut source = MockTimelineSource::new();
        source.expect_fetch_timeline().returning(|_| {
            Ok(json!({ "errors": [{ "code": 88, "message": "Rate limit exceeded" }] }))
        });

        let mut mailer = MockMailDispatcher::new();
        mailer
            .expect_send()
            .withf(|email| {
                email.html
                    == "There was an error parsing twitter’s json response: \
                        expected a list of posts, got an object"
            })
            .times(1)
            .returning(|_| Ok(()));

        let report = pipeline(source, mailer, cursor).run_once().await.unwrap();
        assert_eq!(report.status, RunStatus::Sent);
        assert_eq!(report.posts, 0);
        assert_eq!(report.cursor.as_deref(), Some("1000"));
        assert!(report.detail.starts_with("sent error digest"));
    }

    #[tokio::test]
    async fn test_cursor_write_failure_after_send() {
        let mut cursor = MockCursorStore::new();
        cursor
            .expect_read_cursor()
            .returning(|| Ok(Some("1000".to_string())));
        cursor.expect_write_cursor().times(1).returning(|_| {
            Err(CursorError::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "disk full",
            )))
        });

        let mut source = MockTimelineSource::new();
        source
            .expect_fetch_timeline()
            .returning(|_| Ok(json!([post("1100")])));

        let mut mailer = MockMailDispatcher::new();
        mailer.expect_send().times(1).returning(|_| Ok(()));

        let err = pipeline(source, mailer, cursor).run_once().await.unwrap_err();
        assert!(matches!(err, PipelineError::Cursor(CursorError::Io(_))));
    }

    #[tokio::test]
    async fn test_older_batch_does_not_rewind_cursor() {
        let mut cursor = MockCursorStore::new();
        cursor
            .expect_read_cursor()
            .returning(|| Ok(Some("2000".to_string())));
        cursor.expect_write_cursor().never();

        let mut source = MockTimelineSource::new();
        source
            .expect_fetch_timeline()
            .returning(|_| Ok(json!([post("1100"), post("1050")])));

        let mut mailer = MockMailDispatcher::new();
        mailer.expect_send().times(1).returning(|_| Ok(()));

        let report = pipeline(source, mailer, cursor).run_once().await.unwrap();
        assert_eq!(report.status, RunStatus::Sent);
        assert_eq!(report.posts, 2);
        assert_eq!(report.cursor.as_deref(), Some("2000"));
    }

    #[tokio::test]
    async fn test_longer_id_advances_cursor() {
        let mut cursor = MockCursorStore::new();
        cursor
            .expect_read_cursor()
            .returning(|| Ok(Some("999".to_string())));
        cursor
            .expect_write_cursor()
            .withf(|id| id == "1000")
            .times(1)
            .returning(|_| Ok(()));

        let mut source = MockTimelineSource::new();
        source
            .expect_fetch_timeline()
            .returning(|_| Ok(json!([post("1000")])));

        let mut mailer = MockMailDispatcher::new();
        mailer.expect_send().times(1).returning(|_| Ok(()));

        let report = pipeline(source, mailer, cursor).run_once().await.unwrap();
        assert_eq!(report.cursor.as_deref(), Some("1000"));
    }

    #[tokio::test]
    async fn test_cursor_read_failure_stops_run() {
        let mut cursor = MockCursorStore::new();
        cursor.expect_read_cursor().returning(|| {
            Err(CursorError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });

        let mut source = MockTimelineSource::new();
        source.expect_fetch_timeline().never();
        let mut mailer = MockMailDispatcher::new();
        mailer.expect_send().never();

        let err = pipeline(source, mailer, cursor).run_once().await.unwrap_err();
        assert!(matches!(err, PipelineError::Cursor(_)));
    }
}
