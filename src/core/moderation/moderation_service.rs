// Moderation service - core business logic for the review queue.
//
// This service handles:
// - Classifying submissions (single item vs. album part)
// - Sending moderation requests with approve/reject buttons
// - Resolving moderator decisions (publish or notify rejection)
//
// NO Telegram dependencies here - the transport sits behind `Notifier`.

use super::album_aggregator::AlbumAggregator;
use super::formatting::{
    attribution_header, review_header, with_body, APPROVED_NOTICE, APPROVED_STATUS,
    REJECTED_NOTICE, REJECTED_STATUS, REVIEW_ALBUM_PROMPT, REVIEW_PHOTO_PROMPT,
};
use super::moderation_models::{
    AlbumPart, AlbumSubmission, ContentSubmitted, Decision, DecisionAction, DecisionMade,
    ModerationConfig, PendingSubmission, ReviewMessage, SingleSubmission, SubmissionId,
    SubmittedContent,
};
use super::notifier::{ActionKeyboard, MessageRef, MessageText, Notifier, NotifierError};
use super::submission_store::SubmissionStore;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

const ACKNOWLEDGEMENT_TEXT: &str = "Action processed";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Submission not found: {0}")]
    NotFound(SubmissionId),

    #[error("Transport error: {0}")]
    Transport(#[from] NotifierError),

    #[error("Malformed decision payload: {0:?}")]
    MalformedDecision(String),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<N: Notifier> {
    notifier: N,
    config: ModerationConfig,
    store: SubmissionStore,
    albums: Arc<AlbumAggregator>,
}

impl<N: Notifier + 'static> ModerationService<N> {
    pub fn new(notifier: N, config: ModerationConfig) -> Self {
        let albums = Arc::new(AlbumAggregator::new(config.album_window));
        Self {
            notifier,
            config,
            store: SubmissionStore::new(),
            albums,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Look up a pending submission without consuming it.
    #[allow(dead_code)]
    pub fn pending(&self, id: &SubmissionId) -> Option<PendingSubmission> {
        self.store.get(id)
    }

    /// Classify and buffer an inbound submission.
    ///
    /// Storage is finished when this returns, so calling it from the intake
    /// loop keeps album parts in arrival order. Single items are returned and
    /// still need [`request_review`](Self::request_review); album parts return
    /// `None` because the album is sent for review when its window closes.
    pub fn submit(self: &Arc<Self>, event: ContentSubmitted) -> Option<PendingSubmission> {
        let ContentSubmitted {
            origin_chat,
            origin_message_id,
            group_id,
            content,
            submitter,
        } = event;

        match (group_id, content) {
            (Some(group_id), SubmittedContent::Photo { file_id, caption }) => {
                let part = AlbumPart {
                    message_id: origin_message_id,
                    file_id,
                    caption,
                    submitter,
                };

                let service = Arc::clone(self);
                let flush_group = group_id.clone();
                self.albums.add_part(&group_id, part, move |parts| async move {
                    service.dispatch_album(&flush_group, parts).await;
                });
                None
            }
            (_, content) => {
                let submission = PendingSubmission::Single(SingleSubmission {
                    id: SubmissionId::for_message(origin_chat, origin_message_id),
                    content,
                    submitter,
                    received_at: Utc::now(),
                });

                tracing::info!(
                    submission_id = %submission.id(),
                    pending = self.store.len() + 1,
                    "Submission stored"
                );
                self.store.put(submission.clone());
                Some(submission)
            }
        }
    }

    /// Move a flushed album into the store and send it for review.
    async fn dispatch_album(&self, group_id: &str, parts: Vec<AlbumPart>) {
        let first_message_id = parts.first().map(|p| p.message_id).unwrap_or_default();
        let Some(mut album) = AlbumSubmission::from_parts(group_id, parts) else {
            tracing::warn!(group_id, "Flushed album had no parts");
            return;
        };

        // Parts that missed their window must not replace the album that is
        // still waiting for a decision; they go out as a request of their own.
        if self.store.get(&album.id).is_some() {
            album.id = SubmissionId::for_late_album(group_id, first_message_id);
            tracing::warn!(
                group_id,
                submission_id = %album.id,
                parts = album.photos.len(),
                "Late album parts orphaned into a separate request"
            );
        }

        let id = album.id.clone();
        let parts = album.photos.len();
        let submission = PendingSubmission::Album(album);
        if !self.store.put_if_absent(submission.clone()) {
            tracing::warn!(submission_id = %id, parts, "Album already awaiting review");
            return;
        }
        tracing::info!(submission_id = %id, parts, "Album stored");

        if let Err(e) = self.request_review(&submission).await {
            tracing::error!(group_id, error = %e, "Failed to send album for moderation");
        }
    }

    /// Send a moderation request for a stored submission to the moderator chat.
    ///
    /// Photos and albums cannot carry buttons themselves, so the buttons go in
    /// a follow-up text message. If the content itself fails to send, no
    /// buttons are sent.
    pub async fn request_review(
        &self,
        submission: &PendingSubmission,
    ) -> Result<(), ModerationError> {
        let id = submission.id();
        let submitter = submission.submitter();
        let chat_id = self.config.moderator_chat_id;
        let header = review_header(submitter);
        let keyboard = ActionKeyboard::decision(
            &Decision::approve(id.clone(), submitter),
            &Decision::reject(id.clone(), submitter),
        );

        match submission {
            PendingSubmission::Single(single) => match &single.content {
                SubmittedContent::Text(text) => {
                    let body = MessageText::markdown(with_body(header, Some(text)));
                    self.notifier
                        .send_text(chat_id, &body, Some(&keyboard))
                        .await?;
                }
                SubmittedContent::Photo { file_id, caption } => {
                    let caption = with_body(header, caption.as_deref());
                    self.notifier
                        .send_content(chat_id, file_id, Some(&caption), None)
                        .await?;
                    self.send_review_buttons(id, REVIEW_PHOTO_PROMPT, &keyboard)
                        .await;
                }
            },
            PendingSubmission::Album(album) => {
                let caption = with_body(header, album.caption.as_deref());
                self.notifier
                    .send_album(chat_id, &album.photos, Some(&caption))
                    .await?;
                self.send_review_buttons(id, REVIEW_ALBUM_PROMPT, &keyboard)
                    .await;
            }
        }

        tracing::info!(
            submission_id = %id,
            submitter_chat_id = submitter.chat_id,
            "Moderation request sent"
        );
        Ok(())
    }

    async fn send_review_buttons(
        &self,
        id: &SubmissionId,
        prompt: &str,
        keyboard: &ActionKeyboard,
    ) {
        if let Err(e) = self
            .notifier
            .send_text(
                self.config.moderator_chat_id,
                &MessageText::plain(prompt),
                Some(keyboard),
            )
            .await
        {
            tracing::error!(submission_id = %id, error = %e, "Failed to send moderation buttons");
        }
    }

    /// Apply a moderator decision.
    ///
    /// Whatever the outcome, the review message is closed and the button press
    /// acknowledged. The returned error reports what went wrong with the
    /// decision itself (unknown submission or failed relay).
    pub async fn resolve(&self, event: DecisionMade) -> Result<(), ModerationError> {
        let DecisionMade {
            token,
            decision,
            review_message,
        } = event;

        tracing::info!(
            action = %decision.action,
            submission_id = %decision.submission_id,
            submitter_chat_id = decision.submitter_chat_id,
            "Decision received"
        );

        let (result, status) = match decision.action {
            DecisionAction::Approve => (self.approve(&decision).await, APPROVED_STATUS),
            DecisionAction::Reject => (self.reject(&decision).await, REJECTED_STATUS),
        };

        if let Some(review) = review_message {
            self.close_review(&review, status).await;
        }

        if let Err(e) = self
            .notifier
            .acknowledge_decision(&token, ACKNOWLEDGEMENT_TEXT)
            .await
        {
            tracing::warn!(error = %e, "Failed to acknowledge decision");
        }

        result
    }

    async fn approve(&self, decision: &Decision) -> Result<(), ModerationError> {
        let submission = match self.store.take_and_delete(&decision.submission_id) {
            Some(submission) => submission,
            None => {
                tracing::warn!(
                    submission_id = %decision.submission_id,
                    "Approved submission not found (already resolved or unknown)"
                );
                return Err(ModerationError::NotFound(decision.submission_id.clone()));
            }
        };

        let author = decision
            .submitter_name
            .clone()
            .unwrap_or_else(|| submission.submitter().first_name.clone());
        let header = attribution_header(&author, decision.submitter_chat_id);
        let chat_id = self.config.public_chat_id;

        let relayed = match &submission {
            PendingSubmission::Single(single) => match &single.content {
                SubmittedContent::Text(text) => {
                    let body = MessageText::markdown(with_body(header, Some(text)));
                    self.notifier.send_text(chat_id, &body, None).await
                }
                SubmittedContent::Photo { file_id, caption } => {
                    let caption = with_body(header, caption.as_deref());
                    self.notifier
                        .send_content(chat_id, file_id, Some(&caption), None)
                        .await
                }
            },
            PendingSubmission::Album(album) => {
                let caption = with_body(header, album.caption.as_deref());
                self.notifier
                    .send_album(chat_id, &album.photos, Some(&caption))
                    .await
            }
        };

        if let Err(e) = relayed {
            tracing::error!(
                submission_id = %decision.submission_id,
                error = %e,
                "Failed to publish approved submission"
            );
            return Err(e.into());
        }

        let waited = Utc::now() - submission.received_at();
        tracing::info!(
            submission_id = %decision.submission_id,
            waited_secs = waited.num_seconds(),
            "Submission published"
        );

        self.notify_submitter(decision.submitter_chat_id, APPROVED_NOTICE)
            .await;
        Ok(())
    }

    async fn reject(&self, decision: &Decision) -> Result<(), ModerationError> {
        // The rejection notice never depends on the store; dropping the entry
        // only releases the buffered content.
        if self.store.discard(&decision.submission_id) {
            tracing::debug!(
                submission_id = %decision.submission_id,
                "Discarded rejected submission"
            );
        }

        self.notify_submitter(decision.submitter_chat_id, REJECTED_NOTICE)
            .await;
        Ok(())
    }

    async fn notify_submitter(&self, chat_id: i64, notice: &str) {
        if let Err(e) = self
            .notifier
            .send_text(chat_id, &MessageText::plain(notice), None)
            .await
        {
            tracing::error!(chat_id, error = %e, "Failed to notify submitter");
        }
    }

    /// Append the status line to the review message and strip its buttons.
    async fn close_review(&self, review: &ReviewMessage, status: &str) {
        if review.text.is_empty() {
            tracing::debug!(
                message_id = review.message_id,
                "Review message has no text, skipping update"
            );
            return;
        }

        let message = MessageRef {
            chat_id: review.chat_id,
            message_id: review.message_id,
        };
        let text = MessageText::plain(format!("{}\n\n{}", review.text, status));

        if let Err(e) = self
            .notifier
            .edit_text(message, &text, &ActionKeyboard::empty())
            .await
        {
            tracing::warn!(error = %e, "Failed to update review message");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
