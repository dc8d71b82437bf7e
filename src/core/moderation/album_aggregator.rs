// Album aggregation - collects photo parts that share a group id.
//
// The upstream transport delivers an album as independent messages with no
// "last part" marker. The first part of a group arms a single flush timer;
// when it fires, whatever has been buffered for the group is handed on as one
// album. The window is measured from the first part and is never extended.

use super::moderation_models::AlbumPart;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct AlbumAggregator {
    window: Duration,
    // Group id -> parts in arrival order
    buffers: DashMap<String, Vec<AlbumPart>>,
}

impl AlbumAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            buffers: DashMap::new(),
        }
    }

    /// Buffer one album part.
    ///
    /// If this is the first part of `group_id`, a flush is scheduled `window`
    /// from now and `on_flush` receives the buffered parts when it fires.
    /// For later parts `on_flush` is dropped unused. Returns `true` when a
    /// flush was scheduled.
    pub fn add_part<F, Fut>(self: &Arc<Self>, group_id: &str, part: AlbumPart, on_flush: F) -> bool
    where
        F: FnOnce(Vec<AlbumPart>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!(group_id, message_id = part.message_id, "Album part received");

        // The entry guard holds the shard lock, so appending and deciding
        // whether this is the first part happen together.
        let first = match self.buffers.entry(group_id.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().push(part);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(vec![part]);
                true
            }
        };

        if first {
            tracing::debug!(
                group_id,
                window_ms = self.window.as_millis() as u64,
                "Album buffering started"
            );

            let aggregator = Arc::clone(self);
            let group_id = group_id.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(aggregator.window).await;
                match aggregator.take(&group_id) {
                    Some(parts) if !parts.is_empty() => {
                        tracing::info!(group_id = %group_id, parts = parts.len(), "Flushing album");
                        on_flush(parts).await;
                    }
                    _ => {
                        tracing::warn!(
                            group_id = %group_id,
                            "Album buffer missing or empty at flush time"
                        );
                    }
                }
            });
        }

        first
    }

    /// Remove and return the buffer for a group.
    fn take(&self, group_id: &str) -> Option<Vec<AlbumPart>> {
        self.buffers.remove(group_id).map(|(_, parts)| parts)
    }

    /// Number of groups currently buffering.
    #[allow(dead_code)]
    pub fn pending_groups(&self) -> usize {
        self.buffers.len()
    }
}
