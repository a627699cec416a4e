// Copyright 2026 The Gough Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! §7 degraded-mode cache: the last iPXE script/cloud-init body Control
//! handed back for a given MAC/machine, served for up to
//! [`DEFAULT_CACHE_TTL`] when Control is unreachable.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct Entry {
    body: String,
    stored_at: Instant,
}

/// A single shared cache keyed by an opaque string (a normalized MAC for
/// iPXE scripts, a `{machine_id}/{meta-data|user-data}` path for
/// cloud-init bodies). One instance covers both per worker, since the key
/// spaces never collide.
#[derive(Debug)]
pub struct ScriptCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for ScriptCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ScriptCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn put(&self, key: &str, body: String) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    /// Returns a cached body if present, ignoring its age — the caller
    /// decides whether a stale-but-present entry is acceptable (§7 serves
    /// it regardless of the control-plane outage's length).
    pub fn get_any(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).map(|e| e.body.clone())
    }

    /// Returns a cached body only if it is within the freshness TTL.
    pub fn get_fresh(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|e| {
            if e.stored_at.elapsed() <= self.ttl {
                Some(e.body.clone())
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_returned_by_both_getters() {
        let cache = ScriptCache::new(Duration::from_secs(60));
        cache.put("aabbcc112233", "#!ipxe\nboot\n".to_string());
        assert_eq!(cache.get_fresh("aabbcc112233").as_deref(), Some("#!ipxe\nboot\n"));
        assert!(cache.get_any("aabbcc112233").is_some());
    }

    #[test]
    fn expired_entry_is_hidden_from_get_fresh_but_visible_to_get_any() {
        let cache = ScriptCache::new(Duration::from_millis(1));
        cache.put("aabbcc112233", "#!ipxe\nboot\n".to_string());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get_fresh("aabbcc112233").is_none());
        assert!(cache.get_any("aabbcc112233").is_some());
    }

    #[test]
    fn missing_key_returns_none() {
        let cache = ScriptCache::default();
        assert!(cache.get_any("nope").is_none());
    }
}
