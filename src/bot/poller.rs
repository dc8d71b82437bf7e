// Intake loop - long-polls Telegram and hands each update to the dispatcher.

use super::events::dispatch_update;
use crate::core::moderation::ModerationService;
use crate::infra::telegram::TelegramClient;
use std::sync::Arc;
use std::time::Duration;

/// How long each getUpdates call may wait for new updates.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(60);
/// Pause after a failed poll so a network outage doesn't spin the loop.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Poll forever. Updates are acknowledged to Telegram by advancing the offset.
pub async fn run(service: Arc<ModerationService<TelegramClient>>) {
    let mut offset: i64 = 0;

    loop {
        match service.notifier().get_updates(offset, POLL_TIMEOUT).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!(count = updates.len(), offset, "Received updates");
                }
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    dispatch_update(&service, update);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Polling for updates failed");
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }
}
