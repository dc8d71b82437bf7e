// Core moderation module - the review queue and album aggregation.
// Following the same pattern as the other core modules: models, ports, service.

pub mod album_aggregator;
pub mod formatting;
pub mod moderation_models;
pub mod moderation_service;
pub mod notifier;
pub mod submission_store;

pub use moderation_models::*;
pub use moderation_service::*;
pub use notifier::*;
