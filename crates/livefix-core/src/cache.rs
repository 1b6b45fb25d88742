//! Bounded memo of service results, shared by every surface.
//!
//! Word-level entries are keyed by the normalized word and are reusable on
//! any surface. Sentence-level entries are keyed by the exact string plus the
//! owning surface and are only trusted while that surface is still at the
//! generation the entry was fetched for. Eviction is least-recently-used.

use std::collections::{BTreeMap, HashMap};

use unicode_normalization::UnicodeNormalization;

use crate::types::{Granularity, SurfaceId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    granularity: Granularity,
    text: String,
    scope: Option<SurfaceId>,
}

impl CacheKey {
    /// Surface-agnostic key for a single word (NFC, trimmed).
    pub fn word(text: &str) -> Self {
        Self {
            granularity: Granularity::Word,
            text: normalize_word(text),
            scope: None,
        }
    }

    /// Exact-string key for a sentence, private to `surface`.
    pub fn sentence(text: &str, surface: SurfaceId) -> Self {
        Self {
            granularity: Granularity::Sentence,
            text: text.to_string(),
            scope: Some(surface),
        }
    }

    pub fn for_span(granularity: Granularity, text: &str, surface: SurfaceId) -> Self {
        match granularity {
            Granularity::Word => Self::word(text),
            Granularity::Sentence => Self::sentence(text, surface),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn scope(&self) -> Option<SurfaceId> {
        self.scope
    }
}

pub fn normalize_word(text: &str) -> String {
    text.trim().nfc().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub corrected_text: String,
    pub suggestions: Vec<String>,
    pub fetched_at_generation: u64,
}

impl CacheEntry {
    /// True when the service said the text needs no change.
    pub fn is_unchanged(&self, original: &str) -> bool {
        normalize_word(&self.corrected_text) == normalize_word(original)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Slot {
    entry: CacheEntry,
    stamp: u64,
}

pub struct CorrectionCache {
    capacity: usize,
    entries: HashMap<CacheKey, Slot>,
    /// stamp → key, oldest first.
    recency: BTreeMap<u64, CacheKey>,
    clock: u64,
    stats: CacheStats,
}

impl CorrectionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Plain lookup. Refreshes the entry's recency.
    pub fn get(&mut self, key: &CacheKey) -> Option<&CacheEntry> {
        if !self.entries.contains_key(key) {
            self.stats.misses += 1;
            return None;
        }
        self.stats.hits += 1;
        let stamp = self.next_stamp();
        let slot = self.entries.get_mut(key)?;
        self.recency.remove(&slot.stamp);
        self.recency.insert(stamp, key.clone());
        slot.stamp = stamp;
        Some(&slot.entry)
    }

    /// Lookup that applies the trust rule: sentence entries must match the
    /// surface's current generation, word entries are always trusted.
    pub fn lookup(&mut self, key: &CacheKey, generation: u64) -> Option<&CacheEntry> {
        let stale = match (key.granularity, self.entries.get(key)) {
            (Granularity::Sentence, Some(slot)) => slot.entry.fetched_at_generation != generation,
            _ => false,
        };
        if stale {
            tracing::trace!(key = %key.text, "cache: stale sentence entry");
            self.stats.misses += 1;
            return None;
        }
        self.get(key)
    }

    pub fn put(&mut self, key: CacheKey, entry: CacheEntry) {
        let stamp = self.next_stamp();
        if let Some(old) = self.entries.insert(key.clone(), Slot { entry, stamp }) {
            self.recency.remove(&old.stamp);
        }
        self.recency.insert(stamp, key);
        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
            tracing::trace!(key = %oldest.text, "cache: evicted");
        }
    }

    /// Drop every entry scoped to `surface`. Returns how many were removed.
    pub fn invalidate_surface(&mut self, surface: SurfaceId) -> usize {
        let doomed: Vec<CacheKey> = self
            .entries
            .keys()
            .filter(|k| k.scope == Some(surface))
            .cloned()
            .collect();
        for key in &doomed {
            if let Some(slot) = self.entries.remove(key) {
                self.recency.remove(&slot.stamp);
            }
        }
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
