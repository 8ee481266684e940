//! In-process fallback store.
//!
//! Entries expire lazily: a `get` that finds an expired entry evicts it and
//! reports a miss. Nothing sweeps in the background.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use tokio::time::Instant;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::memory";

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

#[derive(Default)]
pub struct InProcessStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = rw_write(&self.entries, SOURCE, "get.evict");
        // Re-check under the write lock; a concurrent `set` may have replaced it.
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    pub fn set(&self, key: &str, value: String, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set").insert(key.to_string(), entry);
    }

    pub fn del(&self, key: &str) {
        rw_write(&self.entries, SOURCE, "del").remove(key);
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
