//! Email digest of new timeline posts.
//!
//! The builder turns one fetch into an HTML body; the mailer delivers it.

mod builder;
mod email;

pub use builder::{
    build_digest, error_digest, newest_post_id, timeline_records, try_build_digest, EMPTY_DIGEST,
};
#[cfg(test)]
pub use email::MockMailDispatcher;
pub use email::{
    build_message, digest_subject, DigestEmail, MailDispatcher, SmtpMailer, SENDER_NAME,
};
