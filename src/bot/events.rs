// Telegram update handling - translates updates into core moderation events.
//
// **Notice the pattern:**
// 1. Extract primitive data from Telegram types
// 2. Call the core service
// 3. Log the outcome
//
// This layer is THIN - no business logic, just translation.

use crate::core::moderation::{
    ContentSubmitted, Decision, DecisionMade, ModerationError, ModerationService, Notifier,
    ReviewMessage, Submitter, SubmittedContent,
};
use crate::infra::telegram::telegram_models::{CallbackQuery, Message, Update};
use std::sync::Arc;

const UNKNOWN_ACTION_TEXT: &str = "Unknown action";

/// Turn a private message into a submission, or `None` if it is not one.
pub fn content_from_message(message: &Message) -> Option<ContentSubmitted> {
    if !message.chat.is_private() {
        tracing::debug!(chat_id = message.chat.id, "Ignoring message outside a private chat");
        return None;
    }

    let from = message.from.as_ref()?;
    if from.is_bot {
        return None;
    }

    let submitter = Submitter {
        chat_id: message.chat.id,
        first_name: from.first_name.clone(),
        username: from.username.clone(),
    };

    let text = message.text.as_deref().unwrap_or_default();
    if text.trim() == "/start" {
        tracing::info!(chat_id = submitter.chat_id, "Ignoring /start command");
        return None;
    }

    // Telegram lists photo sizes smallest first
    let largest_photo = message.photo.as_ref().and_then(|sizes| sizes.last());

    let content = if let Some(photo) = largest_photo {
        SubmittedContent::Photo {
            file_id: photo.file_id.clone(),
            caption: message.caption.clone().filter(|c| !c.is_empty()),
        }
    } else if !text.is_empty() {
        SubmittedContent::Text(text.to_string())
    } else {
        tracing::info!(
            chat_id = submitter.chat_id,
            message_id = message.message_id,
            "Unsupported message type received"
        );
        return None;
    };

    Some(ContentSubmitted {
        origin_chat: message.chat.id,
        origin_message_id: message.message_id,
        group_id: message.media_group_id.clone(),
        content,
        submitter,
    })
}

/// Decode a button press into a decision.
pub fn decision_from_callback(query: &CallbackQuery) -> Result<DecisionMade, ModerationError> {
    let payload = query.data.as_deref().unwrap_or_default();
    let decision: Decision = payload.parse()?;

    let review_message = query.message.as_ref().map(|message| ReviewMessage {
        chat_id: message.chat.id,
        message_id: message.message_id,
        text: message.text.clone().unwrap_or_default(),
    });

    Ok(DecisionMade {
        token: query.id.clone(),
        decision,
        review_message,
    })
}

/// Handle one update from the intake loop.
///
/// Submissions are stored before this returns so album parts keep their
/// arrival order; all network work is spawned so the loop never waits on it.
pub fn dispatch_update<N: Notifier + 'static>(
    service: &Arc<ModerationService<N>>,
    update: Update,
) {
    if let Some(message) = update.message {
        let Some(event) = content_from_message(&message) else {
            return;
        };

        tracing::info!(
            chat_id = event.origin_chat,
            message_id = event.origin_message_id,
            group_id = event.group_id.as_deref().unwrap_or(""),
            "Submission received"
        );

        if let Some(submission) = service.submit(event) {
            let service = Arc::clone(service);
            tokio::spawn(async move {
                if let Err(e) = service.request_review(&submission).await {
                    tracing::error!(
                        submission_id = %submission.id(),
                        error = %e,
                        "Failed to send submission for moderation"
                    );
                }
            });
        }
    } else if let Some(query) = update.callback_query {
        match decision_from_callback(&query) {
            Ok(event) => {
                let service = Arc::clone(service);
                tokio::spawn(async move {
                    // NotFound and relay failures are logged by the service
                    if let Err(e) = service.resolve(event).await {
                        tracing::debug!(error = %e, "Decision finished with an error");
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding decision");
                let service = Arc::clone(service);
                tokio::spawn(async move {
                    if let Err(e) = service
                        .notifier()
                        .acknowledge_decision(&query.id, UNKNOWN_ACTION_TEXT)
                        .await
                    {
                        tracing::debug!(error = %e, "Failed to acknowledge discarded decision");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{
        ActionKeyboard, DecisionAction, MessageRef, MessageText, ModerationConfig, NotifierError,
    };
    use crate::infra::telegram::telegram_models::{Chat, PhotoSize, User};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records acknowledgements and counts every other call.
    #[derive(Clone, Default)]
    struct AckRecorder {
        acks: Arc<Mutex<Vec<(String, String)>>>,
        other_calls: Arc<Mutex<usize>>,
    }

    impl AckRecorder {
        fn touch(&self) -> Result<MessageRef, NotifierError> {
            *self.other_calls.lock().unwrap() += 1;
            Ok(MessageRef {
                chat_id: 0,
                message_id: 1,
            })
        }
    }

    #[async_trait]
    impl Notifier for AckRecorder {
        async fn send_content(
            &self,
            _chat_id: i64,
            _file_id: &str,
            _caption: Option<&str>,
            _markup: Option<&ActionKeyboard>,
        ) -> Result<MessageRef, NotifierError> {
            self.touch()
        }

        async fn send_album(
            &self,
            _chat_id: i64,
            _file_ids: &[String],
            _first_caption: Option<&str>,
        ) -> Result<MessageRef, NotifierError> {
            self.touch()
        }

        async fn send_text(
            &self,
            _chat_id: i64,
            _text: &MessageText,
            _markup: Option<&ActionKeyboard>,
        ) -> Result<MessageRef, NotifierError> {
            self.touch()
        }

        async fn edit_text(
            &self,
            _message: MessageRef,
            _text: &MessageText,
            _markup: &ActionKeyboard,
        ) -> Result<(), NotifierError> {
            self.touch().map(|_| ())
        }

        async fn acknowledge_decision(&self, token: &str, text: &str) -> Result<(), NotifierError> {
            self.acks
                .lock()
                .unwrap()
                .push((token.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn user() -> User {
        User {
            id: 555,
            is_bot: false,
            first_name: "Alice".to_string(),
            username: Some("alice".to_string()),
        }
    }

    fn private_message(message_id: i64) -> Message {
        Message {
            message_id,
            from: Some(user()),
            chat: Chat {
                id: 555,
                kind: "private".to_string(),
            },
            text: None,
            caption: None,
            photo: None,
            media_group_id: None,
        }
    }

    fn photo(file_id: &str, width: u32) -> PhotoSize {
        PhotoSize {
            file_id: file_id.to_string(),
            width,
            height: width,
        }
    }

    #[test]
    fn test_text_message_becomes_submission() {
        let message = Message {
            text: Some("Hello".to_string()),
            ..private_message(10)
        };

        let event = content_from_message(&message).unwrap();
        assert_eq!(event.origin_chat, 555);
        assert_eq!(event.origin_message_id, 10);
        assert!(event.group_id.is_none());
        assert_eq!(event.content, SubmittedContent::Text("Hello".to_string()));
        assert_eq!(event.submitter.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_album_photo_uses_largest_size() {
        let message = Message {
            photo: Some(vec![photo("small", 90), photo("large", 1280)]),
            caption: Some("trip".to_string()),
            media_group_id: Some("g1".to_string()),
            ..private_message(11)
        };

        let event = content_from_message(&message).unwrap();
        assert_eq!(event.group_id.as_deref(), Some("g1"));
        assert_eq!(
            event.content,
            SubmittedContent::Photo {
                file_id: "large".to_string(),
                caption: Some("trip".to_string()),
            }
        );
    }

    #[test]
    fn test_ignored_messages() {
        let start = Message {
            text: Some("/start".to_string()),
            ..private_message(1)
        };
        assert!(content_from_message(&start).is_none());

        let group = Message {
            text: Some("hi".to_string()),
            chat: Chat {
                id: -100,
                kind: "supergroup".to_string(),
            },
            ..private_message(2)
        };
        assert!(content_from_message(&group).is_none());

        // e.g. a sticker: no text, no photo
        assert!(content_from_message(&private_message(3)).is_none());
    }

    #[test]
    fn test_callback_becomes_decision() {
        let query = CallbackQuery {
            id: "cb-9".to_string(),
            from: user(),
            message: Some(Message {
                text: Some("Please review the photo above and choose an action:".to_string()),
                chat: Chat {
                    id: 100,
                    kind: "private".to_string(),
                },
                ..private_message(77)
            }),
            data: Some("approve:555_10:555:Alice".to_string()),
        };

        let event = decision_from_callback(&query).unwrap();
        assert_eq!(event.token, "cb-9");
        assert_eq!(event.decision.action, DecisionAction::Approve);
        assert_eq!(event.decision.submission_id.as_str(), "555_10");
        let review = event.review_message.unwrap();
        assert_eq!((review.chat_id, review.message_id), (100, 77));
    }

    #[tokio::test]
    async fn test_malformed_callback_is_acknowledged_as_unknown() {
        let notifier = AckRecorder::default();
        let service = Arc::new(ModerationService::new(
            notifier.clone(),
            ModerationConfig {
                moderator_chat_id: 100,
                public_chat_id: 200,
                album_window: Duration::from_secs(3),
            },
        ));

        let update = Update {
            update_id: 1,
            message: None,
            callback_query: Some(CallbackQuery {
                id: "cb-bad".to_string(),
                from: user(),
                message: None,
                data: Some("ban:555_10:555".to_string()),
            }),
        };
        dispatch_update(&service, update);

        for _ in 0..10 {
            if !notifier.acks.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(
            *notifier.acks.lock().unwrap(),
            vec![("cb-bad".to_string(), UNKNOWN_ACTION_TEXT.to_string())]
        );
        assert_eq!(*notifier.other_calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_callback_without_data_is_malformed() {
        let query = CallbackQuery {
            id: "cb-0".to_string(),
            from: user(),
            message: None,
            data: None,
        };
        assert!(matches!(
            decision_from_callback(&query),
            Err(ModerationError::MalformedDecision(_))
        ));
    }
}
