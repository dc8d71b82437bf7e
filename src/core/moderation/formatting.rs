//! Text building for moderator- and public-facing messages.
//!
//! Everything user-supplied goes through [`escape_markdown`] before it is
//! interpolated into a MarkdownV2 message.

use super::moderation_models::Submitter;

/// Characters with special meaning in MarkdownV2.
const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub const REVIEW_PHOTO_PROMPT: &str = "Please review the photo above and choose an action:";
pub const REVIEW_ALBUM_PROMPT: &str = "Please review the album above and choose an action:";

pub const APPROVED_NOTICE: &str = "🎉 Your post has been approved and published in the group!";
pub const REJECTED_NOTICE: &str = "❌ Your post has been rejected by the admin.";

pub const APPROVED_STATUS: &str = "✅ Post has been approved.";
pub const REJECTED_STATUS: &str = "❌ Post has been rejected.";

pub const APPROVE_BUTTON: &str = "✅ Approve";
pub const REJECT_BUTTON: &str = "❌ Reject";

/// Escape every MarkdownV2 reserved character with a backslash.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// "User Alice (@alice) wants to publish:" in MarkdownV2.
pub fn review_header(submitter: &Submitter) -> String {
    match submitter.username.as_deref().filter(|u| !u.is_empty()) {
        Some(username) => format!(
            "User {} \\(@{}\\) wants to publish:",
            escape_markdown(&submitter.first_name),
            escape_markdown(username)
        ),
        None => format!(
            "User {} wants to publish:",
            escape_markdown(&submitter.first_name)
        ),
    }
}

/// Attribution block for a published post, with the author as a user mention.
pub fn attribution_header(author_name: &str, author_chat_id: i64) -> String {
    format!(
        "✅ *New post approved by admin:*\n\n*Author:* [{}](tg://user?id={})",
        escape_markdown(author_name),
        author_chat_id
    )
}

/// Join an already-formatted header with optional raw user text.
pub fn with_body(header: String, body: Option<&str>) -> String {
    match body.filter(|b| !b.is_empty()) {
        Some(body) => format!("{}\n\n{}", header, escape_markdown(body)),
        None => header,
    }
}
