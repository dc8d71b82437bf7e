// Pending submissions waiting for a moderator decision.
//
// The map is private; callers only get atomic operations so there is no
// check-then-act window between a lookup and a removal.

use super::moderation_models::{PendingSubmission, SubmissionId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

pub struct SubmissionStore {
    pending: DashMap<SubmissionId, PendingSubmission>,
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Insert a submission under its own id. Last write wins.
    pub fn put(&self, submission: PendingSubmission) {
        self.pending.insert(submission.id().clone(), submission);
    }

    /// Insert a submission only if its id is free. Returns `false` and leaves
    /// the existing entry untouched otherwise.
    pub fn put_if_absent(&self, submission: PendingSubmission) -> bool {
        match self.pending.entry(submission.id().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(submission);
                true
            }
        }
    }

    /// Non-destructive lookup.
    pub fn get(&self, id: &SubmissionId) -> Option<PendingSubmission> {
        self.pending.get(id).map(|entry| entry.clone())
    }

    /// Atomically remove and return a submission. `None` means it was already
    /// resolved or never existed.
    pub fn take_and_delete(&self, id: &SubmissionId) -> Option<PendingSubmission> {
        self.pending.remove(id).map(|(_, submission)| submission)
    }

    /// Drop a submission without using it. Returns whether it was present.
    pub fn discard(&self, id: &SubmissionId) -> bool {
        self.pending.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{SingleSubmission, SubmittedContent, Submitter};
    use chrono::Utc;
    use std::sync::Arc;

    fn text_submission(chat_id: i64, message_id: i64, text: &str) -> PendingSubmission {
        PendingSubmission::Single(SingleSubmission {
            id: SubmissionId::for_message(chat_id, message_id),
            content: SubmittedContent::Text(text.to_string()),
            submitter: Submitter {
                chat_id,
                first_name: "Alice".to_string(),
                username: None,
            },
            received_at: Utc::now(),
        })
    }

    #[test]
    fn test_take_is_destructive() {
        let store = SubmissionStore::new();
        store.put(text_submission(555, 10, "hello"));

        let id = SubmissionId::for_message(555, 10);
        assert!(store.get(&id).is_some());
        assert!(store.take_and_delete(&id).is_some());
        assert!(store.take_and_delete(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let store = SubmissionStore::new();
        store.put(text_submission(1, 1, "first"));
        store.put(text_submission(1, 1, "second"));

        assert_eq!(store.len(), 1);
        match store.get(&SubmissionId::for_message(1, 1)) {
            Some(PendingSubmission::Single(s)) => {
                assert_eq!(s.content, SubmittedContent::Text("second".to_string()))
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn test_put_if_absent_keeps_existing_entry() {
        let store = SubmissionStore::new();
        assert!(store.put_if_absent(text_submission(1, 1, "first")));
        assert!(!store.put_if_absent(text_submission(1, 1, "second")));

        match store.get(&SubmissionId::for_message(1, 1)) {
            Some(PendingSubmission::Single(s)) => {
                assert_eq!(s.content, SubmittedContent::Text("first".to_string()))
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn test_discard_unknown_id() {
        let store = SubmissionStore::new();
        assert!(!store.discard(&SubmissionId::for_message(9, 9)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_take_yields_exactly_once() {
        let store = Arc::new(SubmissionStore::new());
        store.put(text_submission(7, 7, "race"));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.take_and_delete(&SubmissionId::for_message(7, 7)).is_some()
            }));
        }

        let mut taken = 0;
        for handle in handles {
            if handle.await.unwrap() {
                taken += 1;
            }
        }
        assert_eq!(taken, 1);
    }
}
