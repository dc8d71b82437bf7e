// Moderation domain models - data structures for the review queue.
//
// These are pure domain types with no Telegram dependencies.
// The bot layer converts Telegram updates into these events.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::moderation_service::ModerationError;

/// How long an album buffers parts after its first part arrives.
pub const DEFAULT_ALBUM_WINDOW: Duration = Duration::from_secs(3);

/// Telegram rejects callback payloads longer than this.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Correlation key between a moderation request and its decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionId(String);

impl SubmissionId {
    /// Key for a single text or photo message.
    pub fn for_message(chat_id: i64, message_id: i64) -> Self {
        Self(format!("{}_{}", chat_id, message_id))
    }

    /// Albums are keyed by their group identifier.
    pub fn for_album(group_id: &str) -> Self {
        Self(group_id.to_string())
    }

    /// Key for album parts that arrived after their group was already sent
    /// for review, so they never collide with the pending album.
    pub fn for_late_album(group_id: &str, first_message_id: i64) -> Self {
        Self(format!("{}_{}", group_id, first_message_id))
    }

    #[allow(dead_code)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitter {
    /// Private chat with the submitter (also their user id)
    pub chat_id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

/// Content of a single (non-album) submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmittedContent {
    Text(String),
    Photo {
        /// Transport file reference, reusable for re-sending
        file_id: String,
        caption: Option<String>,
    },
}

/// One photo of an album as it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumPart {
    pub message_id: i64,
    pub file_id: String,
    pub caption: Option<String>,
    pub submitter: Submitter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleSubmission {
    pub id: SubmissionId,
    pub content: SubmittedContent,
    pub submitter: Submitter,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumSubmission {
    pub id: SubmissionId,
    /// File references in arrival order
    pub photos: Vec<String>,
    /// Caption of the first part, if it had one
    pub caption: Option<String>,
    pub submitter: Submitter,
    pub received_at: DateTime<Utc>,
}

impl AlbumSubmission {
    /// Build an album from flushed parts. Returns `None` for an empty flush.
    pub fn from_parts(group_id: &str, parts: Vec<AlbumPart>) -> Option<Self> {
        let first = parts.first()?;
        let submitter = first.submitter.clone();
        let caption = first.caption.clone().filter(|c| !c.is_empty());

        Some(Self {
            id: SubmissionId::for_album(group_id),
            photos: parts.into_iter().map(|p| p.file_id).collect(),
            caption,
            submitter,
            received_at: Utc::now(),
        })
    }
}

/// A submission awaiting a moderator decision.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingSubmission {
    Single(SingleSubmission),
    Album(AlbumSubmission),
}

impl PendingSubmission {
    pub fn id(&self) -> &SubmissionId {
        match self {
            PendingSubmission::Single(s) => &s.id,
            PendingSubmission::Album(a) => &a.id,
        }
    }

    pub fn submitter(&self) -> &Submitter {
        match self {
            PendingSubmission::Single(s) => &s.submitter,
            PendingSubmission::Album(a) => &a.submitter,
        }
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        match self {
            PendingSubmission::Single(s) => s.received_at,
            PendingSubmission::Album(a) => a.received_at,
        }
    }
}

/// What the moderator chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    Approve,
    Reject,
}

impl DecisionAction {
    fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::Approve => "approve",
            DecisionAction::Reject => "reject",
        }
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A moderator decision, decoded from a button payload.
///
/// Wire form: `action:submission_id:submitter_chat_id[:display_name]`.
/// The display name is only carried by approve buttons.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: DecisionAction,
    pub submission_id: SubmissionId,
    pub submitter_chat_id: i64,
    pub submitter_name: Option<String>,
}

impl Decision {
    pub fn approve(submission_id: SubmissionId, submitter: &Submitter) -> Self {
        Self {
            action: DecisionAction::Approve,
            submission_id,
            submitter_chat_id: submitter.chat_id,
            submitter_name: Some(submitter.first_name.clone()),
        }
    }

    pub fn reject(submission_id: SubmissionId, submitter: &Submitter) -> Self {
        Self {
            action: DecisionAction::Reject,
            submission_id,
            submitter_chat_id: submitter.chat_id,
            submitter_name: None,
        }
    }

    /// Encode as a button payload, truncating the display name so the
    /// payload fits the transport limit.
    pub fn encode(&self) -> String {
        let mut payload = format!(
            "{}:{}:{}",
            self.action, self.submission_id, self.submitter_chat_id
        );

        if let Some(name) = &self.submitter_name {
            let budget = MAX_CALLBACK_DATA_LEN.saturating_sub(payload.len() + 1);
            if budget > 0 {
                payload.push(':');
                payload.push_str(truncate_on_char_boundary(name, budget));
            }
        }

        payload
    }
}

impl FromStr for Decision {
    type Err = ModerationError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let malformed = || ModerationError::MalformedDecision(payload.to_string());

        // Names may contain ':' so only split off the first three fields
        let mut parts = payload.splitn(4, ':');
        let action = match parts.next() {
            Some("approve") => DecisionAction::Approve,
            Some("reject") => DecisionAction::Reject,
            _ => return Err(malformed()),
        };

        let submission_id = match parts.next() {
            Some(id) if !id.is_empty() => SubmissionId(id.to_string()),
            _ => return Err(malformed()),
        };

        let submitter_chat_id = parts
            .next()
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(malformed)?;

        let submitter_name = parts
            .next()
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Self {
            action,
            submission_id,
            submitter_chat_id,
            submitter_name,
        })
    }
}

fn truncate_on_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ============================================================================
// INBOUND EVENTS
// ============================================================================

/// A user sent something to the bot.
#[derive(Debug, Clone)]
pub struct ContentSubmitted {
    pub origin_chat: i64,
    pub origin_message_id: i64,
    /// Set when the message is one part of an album
    pub group_id: Option<String>,
    pub content: SubmittedContent,
    pub submitter: Submitter,
}

/// The moderator message that carried the decision buttons.
#[derive(Debug, Clone)]
pub struct ReviewMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

/// The moderator pressed a decision button.
#[derive(Debug, Clone)]
pub struct DecisionMade {
    /// Transport token used to acknowledge the button press
    pub token: String,
    pub decision: Decision,
    pub review_message: Option<ReviewMessage>,
}

/// Where moderation traffic goes.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Chat that receives moderation requests
    pub moderator_chat_id: i64,
    /// Chat that receives approved posts
    pub public_chat_id: i64,
    /// Debounce window for album parts, measured from the first part
    pub album_window: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Submitter {
        Submitter {
            chat_id: 555,
            first_name: "Alice".to_string(),
            username: Some("alice".to_string()),
        }
    }

    #[test]
    fn test_message_submission_id() {
        assert_eq!(SubmissionId::for_message(555, 10).as_str(), "555_10");
    }

    #[test]
    fn test_decision_wire_format() {
        let approve = Decision::approve(SubmissionId::for_message(555, 10), &alice());
        assert_eq!(approve.encode(), "approve:555_10:555:Alice");

        let reject = Decision::reject(SubmissionId::for_message(555, 10), &alice());
        assert_eq!(reject.encode(), "reject:555_10:555");
    }

    #[test]
    fn test_parse_name_with_colons() {
        let decision: Decision = "approve:42:7:Dr: Who".parse().unwrap();
        assert_eq!(decision.action, DecisionAction::Approve);
        assert_eq!(decision.submission_id.as_str(), "42");
        assert_eq!(decision.submitter_chat_id, 7);
        assert_eq!(decision.submitter_name.as_deref(), Some("Dr: Who"));
    }

    #[test]
    fn test_parse_reject_without_name() {
        let decision: Decision = "reject:999_1:999".parse().unwrap();
        assert_eq!(decision.action, DecisionAction::Reject);
        assert_eq!(decision.submitter_name, None);
    }

    #[test]
    fn test_malformed_payloads() {
        for payload in ["", "approve", "approve:1", "approve:1:abc", "ban:1:2", "reject::5"] {
            let result = payload.parse::<Decision>();
            assert!(
                matches!(result, Err(ModerationError::MalformedDecision(_))),
                "{payload:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_long_name_is_truncated_to_payload_limit() {
        let submitter = Submitter {
            first_name: "Ж".repeat(60),
            ..alice()
        };
        let id = SubmissionId::for_album("13897215798123");
        let payload = Decision::approve(id, &submitter).encode();
        assert!(payload.len() <= MAX_CALLBACK_DATA_LEN);

        let decoded: Decision = payload.parse().unwrap();
        assert!(decoded.submitter_name.unwrap().starts_with('Ж'));
    }

    #[test]
    fn test_album_from_parts_keeps_order_and_first_caption() {
        let parts = vec![
            AlbumPart {
                message_id: 1,
                file_id: "a".to_string(),
                caption: Some("first".to_string()),
                submitter: alice(),
            },
            AlbumPart {
                message_id: 2,
                file_id: "b".to_string(),
                caption: Some("ignored".to_string()),
                submitter: alice(),
            },
        ];

        let album = AlbumSubmission::from_parts("g1", parts).unwrap();
        assert_eq!(album.id.as_str(), "g1");
        assert_eq!(album.photos, vec!["a", "b"]);
        assert_eq!(album.caption.as_deref(), Some("first"));
        assert!(AlbumSubmission::from_parts("g2", Vec::new()).is_none());
    }
}
