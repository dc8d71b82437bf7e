// Telegram Bot API wire types.
//
// Only the fields the bot reads are modelled; serde ignores the rest.

use serde::Deserialize;

/// Every Bot API response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// All available sizes of a photo, smallest first
    pub photo: Option<Vec<PhotoSize>>,
    pub media_group_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[allow(dead_code)]
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[allow(dead_code)]
    pub width: u32,
    #[allow(dead_code)]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[allow(dead_code)]
    pub from: User,
    /// The message with the pressed button, absent if it is too old
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_album_part_update() {
        let raw = r#"{
            "ok": true,
            "result": [{
                "update_id": 7001,
                "message": {
                    "message_id": 10,
                    "from": {
                        "id": 555, "is_bot": false, "first_name": "Alice", "username": "alice"
                    },
                    "chat": {"id": 555, "type": "private", "first_name": "Alice"},
                    "date": 1700000000,
                    "media_group_id": "13897215798123",
                    "caption": "trip",
                    "photo": [
                        {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 90},
                        {"file_id": "large", "file_unique_id": "l", "width": 1280, "height": 1280}
                    ]
                }
            }]
        }"#;

        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(response.ok);
        let updates = response.result.unwrap();
        let message = updates[0].message.as_ref().unwrap();
        assert!(message.chat.is_private());
        assert_eq!(message.media_group_id.as_deref(), Some("13897215798123"));
        assert_eq!(message.photo.as_ref().unwrap().last().unwrap().file_id, "large");
    }

    #[test]
    fn test_parse_error_envelope() {
        let raw =
            r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let response: ApiResponse<Message> = serde_json::from_str(raw).unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(
            response.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }
}
