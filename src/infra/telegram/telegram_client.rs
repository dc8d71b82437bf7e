use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use super::telegram_models::{ApiResponse, Message, Update, User};
use crate::core::moderation::{ActionKeyboard, MessageRef, MessageText, Notifier, NotifierError};

const PARSE_MODE: &str = "MarkdownV2";

/// Minimal Telegram Bot API client. It exposes long polling for the intake
/// loop and implements `Notifier` for the core.
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    /// `poll_timeout` is the long-poll wait; the HTTP timeout is a bit longer
    /// so the server always answers first.
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .map_err(|e| NotifierError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{}", token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, NotifierError> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifierError::Http(e.without_url().to_string()))?;

        // Error responses still carry the JSON envelope with a description
        let status = response.status();
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| NotifierError::Http(format!("{} ({})", e.without_url(), status)))?;

        if !envelope.ok {
            return Err(NotifierError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("{} failed with status {}", method, status)),
            ));
        }

        envelope
            .result
            .ok_or_else(|| NotifierError::Api(format!("{} returned no result", method)))
    }

    /// The bot's own account, used to confirm the token at startup.
    pub async fn get_me(&self) -> Result<User, NotifierError> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, NotifierError> {
        let payload = json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &payload).await
    }

    fn keyboard_json(markup: &ActionKeyboard) -> Value {
        let rows: Vec<Vec<Value>> = markup
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| json!({ "text": button.label, "callback_data": button.payload }))
                    .collect()
            })
            .collect();
        json!({ "inline_keyboard": rows })
    }

    fn message_ref(message: &Message) -> MessageRef {
        MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_content(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        markup: Option<&ActionKeyboard>,
    ) -> Result<MessageRef, NotifierError> {
        let mut payload = json!({ "chat_id": chat_id, "photo": file_id });
        if let Some(caption) = caption {
            payload["caption"] = json!(caption);
            payload["parse_mode"] = json!(PARSE_MODE);
        }
        if let Some(markup) = markup {
            payload["reply_markup"] = Self::keyboard_json(markup);
        }

        let message: Message = self.call("sendPhoto", &payload).await?;
        Ok(Self::message_ref(&message))
    }

    async fn send_album(
        &self,
        chat_id: i64,
        file_ids: &[String],
        first_caption: Option<&str>,
    ) -> Result<MessageRef, NotifierError> {
        let media: Vec<Value> = file_ids
            .iter()
            .enumerate()
            .map(|(i, file_id)| {
                let mut item = json!({ "type": "photo", "media": file_id });
                if let (0, Some(caption)) = (i, first_caption) {
                    item["caption"] = json!(caption);
                    item["parse_mode"] = json!(PARSE_MODE);
                }
                item
            })
            .collect();

        let messages: Vec<Message> = self
            .call("sendMediaGroup", &json!({ "chat_id": chat_id, "media": media }))
            .await?;

        messages
            .first()
            .map(Self::message_ref)
            .ok_or_else(|| NotifierError::Api("sendMediaGroup returned no messages".to_string()))
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &MessageText,
        markup: Option<&ActionKeyboard>,
    ) -> Result<MessageRef, NotifierError> {
        let mut payload = json!({ "chat_id": chat_id, "text": text.body });
        if text.markdown {
            payload["parse_mode"] = json!(PARSE_MODE);
        }
        if let Some(markup) = markup {
            payload["reply_markup"] = Self::keyboard_json(markup);
        }

        let message: Message = self.call("sendMessage", &payload).await?;
        Ok(Self::message_ref(&message))
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &MessageText,
        markup: &ActionKeyboard,
    ) -> Result<(), NotifierError> {
        let mut payload = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text.body,
            "reply_markup": Self::keyboard_json(markup),
        });
        if text.markdown {
            payload["parse_mode"] = json!(PARSE_MODE);
        }

        // Returns the edited Message, or `true` for inline messages
        let _: Value = self.call("editMessageText", &payload).await?;
        Ok(())
    }

    async fn acknowledge_decision(&self, token: &str, text: &str) -> Result<(), NotifierError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": token, "text": text }),
            )
            .await?;
        Ok(())
    }
}
