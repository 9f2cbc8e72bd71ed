//! Post body rewriting.
//!
//! Entities become replacement spans over the original text; the output is
//! assembled in one pass so no substitution is ever applied to the output of
//! another.

use std::fmt::Write;

use super::html_escape;
use super::youtube::{youtube_video_id, VideoEmbed};
use crate::twitter::Post;

/// Body HTML plus the video cards discovered while rewriting links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenText {
    pub html: String,
    pub embeds: Vec<VideoEmbed>,
}

/// A claimed byte range of the body and what replaces it.
#[derive(Debug)]
struct Span {
    start: usize,
    end: usize,
    replacement: String,
}

/// Collects non-overlapping spans over one body text.
struct SpanSet<'a> {
    text: &'a str,
    /// Byte offset of each code point, plus `text.len()` at the end.
    boundaries: Vec<usize>,
    spans: Vec<Span>,
}

impl<'a> SpanSet<'a> {
    fn new(text: &'a str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        Self {
            text,
            boundaries,
            spans: Vec::new(),
        }
    }

    fn is_free(&self, start: usize, end: usize) -> bool {
        self.spans.iter().all(|s| end <= s.start || start >= s.end)
    }

    /// Find where `needle` sits in the body.
    ///
    /// Entity offsets win when they point at the needle; otherwise the first
    /// unclaimed occurrence is used. A handle matches case-insensitively and
    /// only where it is not the prefix of a longer handle.
    fn locate(
        &self,
        needle: &str,
        indices: Option<(usize, usize)>,
        handle: bool,
    ) -> Option<(usize, usize)> {
        if needle.is_empty() {
            return None;
        }

        let same = |candidate: &str| {
            if handle {
                candidate.eq_ignore_ascii_case(needle)
            } else {
                candidate == needle
            }
        };

        if let Some((first, last)) = indices {
            if first < last && last < self.boundaries.len() {
                let (start, end) = (self.boundaries[first], self.boundaries[last]);
                if same(&self.text[start..end]) && self.is_free(start, end) {
                    return Some((start, end));
                }
            }
        }

        // ASCII lowercasing keeps byte offsets stable
        let (haystack, needle) = if handle {
            (self.text.to_ascii_lowercase(), needle.to_ascii_lowercase())
        } else {
            (self.text.to_string(), needle.to_string())
        };

        haystack
            .match_indices(needle.as_str())
            .map(|(start, m)| (start, start + m.len()))
            .find(|&(start, end)| {
                self.is_free(start, end) && (!handle || self.ends_handle(end))
            })
    }

    fn ends_handle(&self, end: usize) -> bool {
        !self
            .text
            .as_bytes()
            .get(end)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
    }

    fn claim(&mut self, range: (usize, usize), replacement: String) {
        self.spans.push(Span {
            start: range.0,
            end: range.1,
            replacement,
        });
    }

    fn matched(&self, range: (usize, usize)) -> &'a str {
        &self.text[range.0..range.1]
    }

    fn assemble(mut self) -> String {
        self.spans.sort_by_key(|s| s.start);

        let mut out = String::with_capacity(self.text.len() * 2);
        let mut cursor = 0;
        for span in &self.spans {
            out.push_str(&self.text[cursor..span.start]);
            out.push_str(&span.replacement);
            cursor = span.end;
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

/// Rewrite a post body: link mentions and URLs, drop inline media URLs,
/// turn newlines into `<br>`.
#[must_use]
pub fn rewrite_text(post: &Post) -> RewrittenText {
    let mut spans = SpanSet::new(post.display_text());
    let mut embeds = Vec::new();

    for mention in &post.entities.user_mentions {
        let needle = format!("@{}", mention.screen_name);
        let Some(range) = spans.locate(&needle, mention.indices, true) else {
            tracing::debug!(handle = %mention.screen_name, "Mention not found in text");
            continue;
        };

        let mut anchor = String::new();
        let _ = write!(
            anchor,
            r#"<a href="https://twitter.com/{handle}" style="text-decoration: none">{text}</a>"#,
            handle = html_escape(&mention.screen_name),
            text = html_escape(spans.matched(range)),
        );
        spans.claim(range, anchor);
    }

    for link in &post.entities.urls {
        let target = link.target();
        if let Some(id) = youtube_video_id(target) {
            embeds.push(VideoEmbed {
                id: id.to_string(),
                url: target.to_string(),
            });
        }

        let Some(range) = spans.locate(&link.url, link.indices, false) else {
            tracing::debug!(url = %link.url, "Link not found in text");
            continue;
        };
        let anchor = format!(
            r#"<a href="{href}">{label}</a>"#,
            href = html_escape(target),
            label = html_escape(link.label()),
        );
        spans.claim(range, anchor);
    }

    for media in &post.entities.media {
        if let Some(range) = spans.locate(&media.url, media.indices, false) {
            spans.claim(range, String::new());
        }
    }

    RewrittenText {
        html: spans.assemble().replace('\n', "<br>"),
        embeds,
    }
}
