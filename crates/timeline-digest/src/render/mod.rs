//! Post rendering.
//!
//! Turns one post (with its retweet or quote) into an inline-styled HTML
//! fragment for the digest email. Body text is emitted as the API delivers
//! it (already entity-escaped); names and URLs going into markup are escaped
//! here.

mod text;
mod youtube;

use std::fmt::Write;

pub use text::{rewrite_text, RewrittenText};
pub use youtube::{youtube_video_id, VideoEmbed};

use crate::error::RenderError;
use crate::twitter::Post;

const SEPARATOR_STYLE: &str =
    " padding-bottom: 30px; border-bottom: 2px solid #ccd6dd; margin-bottom: 30px;";
const BLOCK_IMAGE_STYLE: &str =
    "display: block; max-width: 100%; margin-left: auto; margin-right: auto;";

/// Render a timeline entry.
///
/// Retweets get a "🔁 {name} retweeted" line followed by the original post.
/// `border` adds the bottom separator that divides posts in the digest.
pub fn render_post(post: &Post, border: bool) -> Result<String, RenderError> {
    match &post.retweeted_status {
        Some(original) => {
            require_fields(post)?;
            let mut html = format!(
                r#"<p style="font-weight: bold; font-size: 0.8em">🔁 {} retweeted</p>"#,
                html_escape(&post.user.name)
            );
            html.push_str(&render_card(original, border, true)?);
            Ok(html)
        }
        None => render_card(post, border, true),
    }
}

fn require_fields(post: &Post) -> Result<(), RenderError> {
    if post.id_str.is_empty() {
        return Err(RenderError::MissingField {
            id: post.id_str.clone(),
            field: "id_str",
        });
    }
    if post.user.screen_name.is_empty() {
        return Err(RenderError::MissingField {
            id: post.id_str.clone(),
            field: "user.screen_name",
        });
    }
    Ok(())
}

/// One post card. Quotes render one level deep.
fn render_card(post: &Post, border: bool, with_quote: bool) -> Result<String, RenderError> {
    require_fields(post)?;

    let body = rewrite_text(post);
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<div style="max-width: 100%; word-wrap: break-word; hyphens: auto;{separator}">"#,
        separator = if border { SEPARATOR_STYLE } else { "" },
    );

    if let Some(avatar) = &post.user.profile_image_url_https {
        let _ = write!(
            html,
            r#"<img src="{}" style="clear: left; float: left; margin-right: 10px;">"#,
            html_escape(avatar)
        );
    }

    let _ = write!(
        html,
        r#"<h4 style="margin: 0;"><a style="color: inherit; text-decoration: none;" href="{url}">{name}</a><br><small style="color: grey">@{handle}</small></h4>"#,
        url = html_escape(&post.status_url()),
        name = html_escape(&post.user.name),
        handle = html_escape(&post.user.screen_name),
    );

    html.push_str(r#"<div style="clear: left; margin-top: 20px;">"#);
    html.push_str(&body.html);

    for embed in &body.embeds {
        push_image_link(&mut html, &embed.url, &embed.thumbnail_url());
    }

    for media in post.attachments() {
        if media.media_url_https.is_empty() {
            continue;
        }
        push_image_link(&mut html, &media.media_url_https, &media.media_url_https);
    }

    if with_quote {
        if let Some(quoted) = &post.quoted_status {
            html.push_str(
                r#"<div style="padding: 10px; margin-top: 20px; margin-left: 10px; border: 1px solid #ccd6dd; border-radius: 3px;">"#,
            );
            html.push_str(&render_card(quoted, false, false)?);
            html.push_str("</div>");
        }
    }

    html.push_str("</div></div>");
    Ok(html)
}

fn push_image_link(html: &mut String, href: &str, src: &str) {
    let _ = write!(
        html,
        r#"<a href="{href}" style="display:block; margin-top: 20px;"><img src="{src}" style="{BLOCK_IMAGE_STYLE}"></a>"#,
        href = html_escape(href),
        src = html_escape(src),
    );
}

/// Escape text for use in HTML content and double-quoted attributes.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
