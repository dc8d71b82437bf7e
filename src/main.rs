// This is the entry point of the moderation relay bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic review queue)
// - `infra/` = Implementations of core traits (Telegram API, config loading)
// - `bot/` = Telegram-specific adapters (update translation, intake loop)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the intake loop until shutdown

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a pile of mod.rs files that all look the same.
#[path = "bot/bot_layer.rs"]
mod bot;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::bot::poller;
use crate::core::moderation::ModerationService;
use crate::infra::config::AppConfig;
use crate::infra::telegram::TelegramClient;
use anyhow::Context;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let client = TelegramClient::new(&config.bot_token, poller::POLL_TIMEOUT)
        .context("Failed to create Telegram client")?;

    let me = client
        .get_me()
        .await
        .context("Failed to authorize with the Telegram Bot API")?;
    tracing::info!(
        username = me.username.as_deref().unwrap_or(&me.first_name),
        "Authorized on account"
    );

    tracing::info!(
        moderator_chat_id = config.moderation.moderator_chat_id,
        public_chat_id = config.moderation.public_chat_id,
        album_window_secs = config.moderation.album_window.as_secs(),
        "Bot is running"
    );

    let service = Arc::new(ModerationService::new(client, config.moderation));

    // Pending submissions live only in memory and are dropped on shutdown
    tokio::select! {
        _ = poller::run(service) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
