//! Twitter timeline data types.
//!
//! Field names follow the v1.1 timeline JSON so records deserialize
//! directly; accessors expose the renderer's view of a post.

use serde::{Deserialize, Serialize};

/// One timeline entry: an original post, a retweet, or a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Post ID, sortable by recency within one feed.
    pub id_str: String,
    /// Post author.
    pub user: Author,
    /// Long-form body (present in extended mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    /// Short-form body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Structured annotations on the body text.
    #[serde(default)]
    pub entities: Entities,
    /// Full attachment list (all images of a multi-image post).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_entities: Option<ExtendedEntities>,
    /// The original post when this entry is a retweet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<Post>>,
    /// The quoted post, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_status: Option<Box<Post>>,
}

impl Post {
    /// Create a post with minimal required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, user: Author, text: impl Into<String>) -> Self {
        Self {
            id_str: id.into(),
            user,
            full_text: Some(text.into()),
            text: None,
            entities: Entities::default(),
            extended_entities: None,
            retweeted_status: None,
            quoted_status: None,
        }
    }

    /// Body text, preferring the long form.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.full_text
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or_default()
    }

    /// Whether this entry wraps a retweeted post.
    #[must_use]
    pub fn is_retweet(&self) -> bool {
        self.retweeted_status.is_some()
    }

    /// Media to render as images, in original order.
    ///
    /// `extended_entities` carries every image; `entities.media` only the
    /// first, so it is the fallback.
    #[must_use]
    pub fn attachments(&self) -> &[MediaEntity] {
        match &self.extended_entities {
            Some(extended) if !extended.media.is_empty() => &extended.media,
            _ => &self.entities.media,
        }
    }

    /// Permalink to this post.
    #[must_use]
    pub fn status_url(&self) -> String {
        format!(
            "https://twitter.com/{}/status/{}",
            self.user.screen_name, self.id_str
        )
    }
}

/// Author information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// Display name.
    pub name: String,
    /// Twitter handle (without @).
    pub screen_name: String,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url_https: Option<String>,
}

impl Author {
    /// Create a new author.
    #[must_use]
    pub fn new(screen_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            screen_name: screen_name.into(),
            profile_image_url_https: None,
        }
    }

    /// Get the handle with @ prefix.
    #[must_use]
    pub fn at_handle(&self) -> String {
        format!("@{}", self.screen_name)
    }
}

/// Text annotations attached to a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    /// `@handle` mentions, in text order.
    #[serde(default)]
    pub user_mentions: Vec<Mention>,
    /// Shortened links, in text order.
    #[serde(default)]
    pub urls: Vec<Link>,
    /// Media references embedded in the text.
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

/// Container for the complete media list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

/// A mentioned user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Handle (without @).
    pub screen_name: String,
    /// Code-point offsets of `@handle` in the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<(usize, usize)>,
}

impl Mention {
    /// Create a mention without offsets.
    #[must_use]
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
            indices: None,
        }
    }
}

/// A shortened link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Short form as it appears in the body.
    pub url: String,
    /// Resolved target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_url: Option<String>,
    /// Human-readable form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_url: Option<String>,
    /// Code-point offsets of the short form in the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<(usize, usize)>,
}

impl Link {
    /// Create a link without offsets.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        expanded_url: impl Into<String>,
        display_url: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            expanded_url: Some(expanded_url.into()),
            display_url: Some(display_url.into()),
            indices: None,
        }
    }

    /// Link target, falling back to the short form.
    #[must_use]
    pub fn target(&self) -> &str {
        self.expanded_url.as_deref().unwrap_or(&self.url)
    }

    /// Anchor text, falling back to the short form.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_url.as_deref().unwrap_or(&self.url)
    }
}

/// An attached image (or video poster).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntity {
    /// Short form as it appears in the body.
    #[serde(default)]
    pub url: String,
    /// Full-size image URL.
    #[serde(default)]
    pub media_url_https: String,
    /// Code-point offsets of the short form in the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<(usize, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_text_prefers_full_text() {
        let post: Post = serde_json::from_value(json!({
            "id_str": "1",
            "user": { "name": "A", "screen_name": "a" },
            "text": "short…",
            "full_text": "the whole thing"
        }))
        .unwrap();
        assert_eq!(post.display_text(), "the whole thing");

        let post: Post = serde_json::from_value(json!({
            "id_str": "2",
            "user": { "name": "A", "screen_name": "a" },
            "text": "only short"
        }))
        .unwrap();
        assert_eq!(post.display_text(), "only short");
    }

    #[test]
    fn test_missing_user_is_rejected() {
        let result = serde_json::from_value::<Post>(json!({ "id_str": "3", "full_text": "hi" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_attachments_fall_back_to_entities() {
        let post: Post = serde_json::from_value(json!({
            "id_str": "4",
            "user": { "name": "A", "screen_name": "a" },
            "full_text": "pic https://t.co/p",
            "entities": {
                "media": [{ "url": "https://t.co/p", "media_url_https": "https://pbs.twimg.com/1.jpg" }]
            }
        }))
        .unwrap();
        assert_eq!(post.attachments().len(), 1);
        assert_eq!(
            post.attachments()[0].media_url_https,
            "https://pbs.twimg.com/1.jpg"
        );
    }

    #[test]
    fn test_indices_deserialize_as_pair() {
        let mention: Mention =
            serde_json::from_value(json!({ "screen_name": "rustlang", "indices": [3, 12] }))
                .unwrap();
        assert_eq!(mention.indices, Some((3, 12)));
    }

    #[test]
    fn test_status_url() {
        let post = Post::new("100", Author::new("jack", "Jack"), "just setting up");
        assert_eq!(post.status_url(), "https://twitter.com/jack/status/100");
        assert_eq!(post.user.at_handle(), "@jack");
    }
}
