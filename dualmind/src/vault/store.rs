//! Vault state: primary map, derived indices, consolidation queue.
//!
//! Everything here is synchronous. [`crate::vault::MemoryVault`] keeps one
//! `VaultState` behind a single lock so every index update is applied
//! atomically with the primary map.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::VaultConfig;
use crate::vault::consolidation::consolidated_level;
use crate::vault::types::{MemoryItem, ScoredMemory, SearchQuery, StoreOutcome, VaultStats};

/// Relevance at or below this is dropped from search results.
const MIN_RELEVANCE: f64 = 0.1;

pub(crate) struct VaultState {
    config: VaultConfig,
    memories: HashMap<Uuid, MemoryItem>,
    /// association -> ids
    semantic_index: BTreeMap<String, BTreeSet<Uuid>>,
    /// emotional label -> ids
    emotional_index: BTreeMap<String, BTreeSet<Uuid>>,
    /// UTC creation day -> ids
    temporal_index: BTreeMap<NaiveDate, BTreeSet<Uuid>>,
    consolidation_queue: VecDeque<Uuid>,
    access_history: HashMap<Uuid, VecDeque<DateTime<Utc>>>,
}

impl VaultState {
    pub(crate) fn new(config: VaultConfig) -> Self {
        Self {
            config,
            memories: HashMap::new(),
            semantic_index: BTreeMap::new(),
            emotional_index: BTreeMap::new(),
            temporal_index: BTreeMap::new(),
            consolidation_queue: VecDeque::new(),
            access_history: HashMap::new(),
        }
    }

    pub(crate) fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub(crate) fn len(&self) -> usize {
        self.memories.len()
    }

    /// Insert (or replace) a memory, then run queue-triggered consolidation
    /// and capacity eviction.
    pub(crate) fn store(&mut self, mut item: MemoryItem, now: DateTime<Utc>) -> StoreOutcome {
        item.normalize_labels();
        item.emotional_weight = clamp_unit(item.emotional_weight);
        item.consolidation_level = clamp_unit(item.consolidation_level);
        item.links.retain(|link| *link != item.id && self.memories.contains_key(link));

        if let Some(previous) = self.memories.remove(&item.id) {
            self.unindex(&previous);
        }

        let id = item.id;
        let needs_consolidation = item.consolidation_level < self.config.consolidation_threshold;
        self.index(&item);
        self.memories.insert(id, item);

        if needs_consolidation && !self.consolidation_queue.contains(&id) {
            self.consolidation_queue.push_back(id);
        }

        let consolidated = if self.consolidation_queue.len() >= self.config.queue_capacity {
            self.run_consolidation_batch(now)
        } else {
            0
        };

        let evicted = if self.memories.len() > self.config.max_memories {
            self.evict()
        } else {
            Vec::new()
        };

        debug!(
            memory_id = %id,
            total = self.memories.len(),
            queued = self.consolidation_queue.len(),
            "Stored memory"
        );

        StoreOutcome {
            id,
            consolidated,
            evicted,
        }
    }

    /// Fetch a memory and record the access.
    pub(crate) fn retrieve(&mut self, id: Uuid, now: DateTime<Utc>) -> Option<MemoryItem> {
        let item = self.memories.get_mut(&id)?;
        item.access_count += 1;

        let history = self.access_history.entry(id).or_default();
        history.push_back(now);
        while history.len() > self.config.access_history_limit {
            history.pop_front();
        }

        Some(item.clone())
    }

    /// Score and rank memories for a query.
    pub(crate) fn search(&self, query: &SearchQuery, now: DateTime<Utc>) -> Vec<ScoredMemory> {
        let needle = query.text.trim().to_lowercase();
        let emotion = query
            .emotional_filter
            .as_ref()
            .map(|e| e.trim().to_lowercase());
        let cutoff = query.timeframe.map(|window| now - window);
        let recent_window = Duration::seconds(self.config.recent_access_window_secs);

        let mut results: Vec<ScoredMemory> = self
            .memories
            .values()
            .filter(|item| cutoff.map_or(true, |cutoff| item.timestamp >= cutoff))
            .filter(|item| {
                query
                    .memory_types
                    .as_ref()
                    .map_or(true, |types| types.contains(&item.memory_type))
            })
            .filter(|item| {
                emotion
                    .as_ref()
                    .map_or(true, |emotion| item.emotional_state.contains(emotion.as_str()))
            })
            .filter_map(|item| {
                let mut relevance = 0.0;
                if item.content.to_lowercase().contains(&needle) {
                    relevance += 0.4;
                }
                if item.associations.iter().any(|a| a.contains(&needle)) {
                    relevance += 0.3;
                }
                relevance += item.emotional_weight * 0.2;
                relevance += item.consolidation_level * 0.1;

                let recently_accessed = self
                    .access_history
                    .get(&item.id)
                    .and_then(|history| history.back())
                    .is_some_and(|last| now - *last < recent_window);
                if recently_accessed {
                    relevance += 0.1;
                }

                (relevance > MIN_RELEVANCE).then(|| ScoredMemory {
                    memory: item.clone(),
                    relevance,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| b.memory.timestamp.cmp(&a.memory.timestamp))
                .then_with(|| a.memory.id.cmp(&b.memory.id))
        });
        results.truncate(query.limit);
        results
    }

    /// Consolidate up to `batch_size` queued ids. Returns how many were processed.
    pub(crate) fn run_consolidation_batch(&mut self, now: DateTime<Utc>) -> usize {
        let mut processed = 0;
        while processed < self.config.batch_size {
            let Some(id) = self.consolidation_queue.pop_front() else {
                break;
            };
            if self.consolidate(id, now) {
                processed += 1;
            }
        }

        if processed > 0 {
            debug!(
                processed,
                remaining = self.consolidation_queue.len(),
                "Consolidation batch complete"
            );
        }
        processed
    }

    fn consolidate(&mut self, id: Uuid, now: DateTime<Utc>) -> bool {
        let Some(item) = self.memories.get(&id) else {
            return false;
        };

        let level = consolidated_level(item, now, self.config.recency_window_days);

        let mut links = item.links.clone();
        for association in &item.associations {
            let Some(candidates) = self.semantic_index.get(association) else {
                continue;
            };
            for candidate in candidates {
                if links.len() >= self.config.max_links {
                    break;
                }
                if *candidate != id {
                    links.insert(*candidate);
                }
            }
        }

        if let Some(item) = self.memories.get_mut(&id) {
            item.consolidation_level = item.consolidation_level.max(level);
            item.links = links;
        }
        true
    }

    /// Remove the least consolidated, oldest memories until the vault is
    /// back under capacity with headroom.
    pub(crate) fn evict(&mut self) -> Vec<Uuid> {
        let max = self.config.max_memories;
        let total = self.memories.len();
        if total <= max {
            return Vec::new();
        }

        let excess = total - max;
        let headroom = (max as f64 * self.config.eviction_headroom).floor() as usize;
        let count = (excess + headroom).min(total);

        let mut ranked: Vec<(f64, DateTime<Utc>, Uuid)> = self
            .memories
            .values()
            .map(|item| (item.consolidation_level, item.timestamp, item.id))
            .collect();
        ranked.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let removed: Vec<Uuid> = ranked.into_iter().take(count).map(|(_, _, id)| id).collect();
        self.purge(&removed);

        info!(
            evicted = removed.len(),
            remaining = self.memories.len(),
            max_memories = max,
            "Evicted memories over capacity"
        );
        removed
    }

    fn purge(&mut self, ids: &[Uuid]) {
        let gone: HashSet<Uuid> = ids.iter().copied().collect();
        for id in ids {
            if let Some(item) = self.memories.remove(id) {
                self.unindex(&item);
            }
            self.access_history.remove(id);
        }
        self.consolidation_queue.retain(|id| !gone.contains(id));
        for item in self.memories.values_mut() {
            item.links.retain(|link| !gone.contains(link));
        }
    }

    /// Replace the whole vault with `items`, rebuilding every index.
    pub(crate) fn restore(&mut self, items: Vec<MemoryItem>) -> usize {
        self.memories.clear();
        self.semantic_index.clear();
        self.emotional_index.clear();
        self.temporal_index.clear();
        self.consolidation_queue.clear();
        self.access_history.clear();

        for mut item in items {
            item.normalize_labels();
            item.emotional_weight = clamp_unit(item.emotional_weight);
            item.consolidation_level = clamp_unit(item.consolidation_level);
            if let Some(previous) = self.memories.remove(&item.id) {
                self.unindex(&previous);
            }
            self.index(&item);
            self.memories.insert(item.id, item);
        }

        let known: HashSet<Uuid> = self.memories.keys().copied().collect();
        for item in self.memories.values_mut() {
            let id = item.id;
            item.links.retain(|link| *link != id && known.contains(link));
        }

        let mut pending: Vec<&MemoryItem> = self
            .memories
            .values()
            .filter(|item| item.consolidation_level < self.config.consolidation_threshold)
            .collect();
        pending.sort_by_key(|item| (item.timestamp, item.id));
        let queue: VecDeque<Uuid> = pending
            .into_iter()
            .take(self.config.queue_capacity)
            .map(|item| item.id)
            .collect();
        self.consolidation_queue = queue;

        self.evict();
        self.memories.len()
    }

    /// All memories, oldest first.
    pub(crate) fn snapshot(&self) -> Vec<MemoryItem> {
        let mut items: Vec<MemoryItem> = self.memories.values().cloned().collect();
        items.sort_by_key(|item| (item.timestamp, item.id));
        items
    }

    pub(crate) fn stats(&self) -> VaultStats {
        let mut by_type = BTreeMap::new();
        for item in self.memories.values() {
            *by_type.entry(item.memory_type).or_insert(0) += 1;
        }

        let mean_consolidation = if self.memories.is_empty() {
            0.0
        } else {
            self.memories
                .values()
                .map(|item| item.consolidation_level)
                .sum::<f64>()
                / self.memories.len() as f64
        };

        VaultStats {
            total: self.memories.len(),
            queued: self.consolidation_queue.len(),
            by_type,
            mean_consolidation,
            association_count: self.semantic_index.len(),
            emotional_state_count: self.emotional_index.len(),
            day_count: self.temporal_index.len(),
        }
    }

    /// Check that indices, queue, access history and links only reference
    /// stored memories and that every memory sits in exactly its buckets.
    pub(crate) fn verify_invariants(&self) -> Result<(), String> {
        if self.memories.len() > self.config.max_memories {
            return Err(format!(
                "{} memories exceed capacity {}",
                self.memories.len(),
                self.config.max_memories
            ));
        }

        for (association, ids) in &self.semantic_index {
            for id in ids {
                match self.memories.get(id) {
                    Some(item) if item.associations.contains(association) => {}
                    _ => return Err(format!("semantic bucket '{association}' holds stale id {id}")),
                }
            }
        }
        for (label, ids) in &self.emotional_index {
            for id in ids {
                match self.memories.get(id) {
                    Some(item) if &item.emotional_state == label => {}
                    _ => return Err(format!("emotional bucket '{label}' holds stale id {id}")),
                }
            }
        }
        for (day, ids) in &self.temporal_index {
            for id in ids {
                match self.memories.get(id) {
                    Some(item) if item.timestamp.date_naive() == *day => {}
                    _ => return Err(format!("temporal bucket {day} holds stale id {id}")),
                }
            }
        }

        for (id, item) in &self.memories {
            for association in &item.associations {
                if !self
                    .semantic_index
                    .get(association)
                    .is_some_and(|ids| ids.contains(id))
                {
                    return Err(format!("memory {id} missing from semantic bucket '{association}'"));
                }
            }
            if !self
                .emotional_index
                .get(&item.emotional_state)
                .is_some_and(|ids| ids.contains(id))
            {
                return Err(format!("memory {id} missing from its emotional bucket"));
            }
            if !self
                .temporal_index
                .get(&item.timestamp.date_naive())
                .is_some_and(|ids| ids.contains(id))
            {
                return Err(format!("memory {id} missing from its temporal bucket"));
            }
            if item.links.len() > self.config.max_links {
                return Err(format!("memory {id} has {} links", item.links.len()));
            }
            if let Some(link) = item
                .links
                .iter()
                .find(|link| **link == *id || !self.memories.contains_key(*link))
            {
                return Err(format!("memory {id} links to invalid id {link}"));
            }
        }

        if let Some(id) = self
            .consolidation_queue
            .iter()
            .find(|id| !self.memories.contains_key(*id))
        {
            return Err(format!("consolidation queue holds stale id {id}"));
        }
        if let Some(id) = self
            .access_history
            .keys()
            .find(|id| !self.memories.contains_key(*id))
        {
            return Err(format!("access history holds stale id {id}"));
        }

        Ok(())
    }

    fn index(&mut self, item: &MemoryItem) {
        for association in &item.associations {
            self.semantic_index
                .entry(association.clone())
                .or_default()
                .insert(item.id);
        }
        self.emotional_index
            .entry(item.emotional_state.clone())
            .or_default()
            .insert(item.id);
        self.temporal_index
            .entry(item.timestamp.date_naive())
            .or_default()
            .insert(item.id);
    }

    fn unindex(&mut self, item: &MemoryItem) {
        for association in &item.associations {
            remove_from_bucket(&mut self.semantic_index, association, item.id);
        }
        remove_from_bucket(&mut self.emotional_index, &item.emotional_state, item.id);
        remove_from_bucket(&mut self.temporal_index, &item.timestamp.date_naive(), item.id);
    }
}

fn remove_from_bucket<K: Ord>(index: &mut BTreeMap<K, BTreeSet<Uuid>>, key: &K, id: Uuid) {
    if let Some(ids) = index.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
