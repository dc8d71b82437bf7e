// The infra module contains implementations of core traits and other
// outside-world plumbing. Each concern goes in its own submodule.

#[path = "config/mod.rs"]
pub mod config;

#[path = "telegram/mod.rs"]
pub mod telegram;
