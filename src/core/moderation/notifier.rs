// Outbound messaging port.
//
// The core only needs a handful of send/edit primitives. The Telegram client in
// infra implements this trait; tests use a recording mock.

use super::moderation_models::Decision;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {0}")]
    Api(String),
}

/// Identifies a message the notifier sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Text plus how the transport should render it.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageText {
    pub body: String,
    /// Rendered as MarkdownV2 when set; callers must escape user text
    pub markdown: bool,
}

impl MessageText {
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            markdown: false,
        }
    }

    pub fn markdown(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            markdown: true,
        }
    }
}

/// A button that sends `payload` back as a decision when pressed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionButton {
    pub label: String,
    pub payload: String,
}

/// Inline buttons attached to a message. An empty keyboard removes buttons.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionKeyboard {
    pub rows: Vec<Vec<ActionButton>>,
}

impl ActionKeyboard {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One row with an approve and a reject button.
    pub fn decision(approve: &Decision, reject: &Decision) -> Self {
        use super::formatting::{APPROVE_BUTTON, REJECT_BUTTON};

        Self {
            rows: vec![vec![
                ActionButton {
                    label: APPROVE_BUTTON.to_string(),
                    payload: approve.encode(),
                },
                ActionButton {
                    label: REJECT_BUTTON.to_string(),
                    payload: reject.encode(),
                },
            ]],
        }
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a single photo with an optional MarkdownV2 caption.
    async fn send_content(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        markup: Option<&ActionKeyboard>,
    ) -> Result<MessageRef, NotifierError>;

    /// Send photos as one album. Only the first item carries the caption.
    async fn send_album(
        &self,
        chat_id: i64,
        file_ids: &[String],
        first_caption: Option<&str>,
    ) -> Result<MessageRef, NotifierError>;

    async fn send_text(
        &self,
        chat_id: i64,
        text: &MessageText,
        markup: Option<&ActionKeyboard>,
    ) -> Result<MessageRef, NotifierError>;

    /// Replace the text and buttons of a previously sent message.
    async fn edit_text(
        &self,
        message: MessageRef,
        text: &MessageText,
        markup: &ActionKeyboard,
    ) -> Result<(), NotifierError>;

    /// Transport-level acknowledgement of a button press.
    async fn acknowledge_decision(&self, token: &str, text: &str) -> Result<(), NotifierError>;
}
