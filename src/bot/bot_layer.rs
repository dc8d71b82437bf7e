// Bot layer - Telegram update handling and the intake loop.

pub mod events;
pub mod poller;
