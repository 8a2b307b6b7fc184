//! Memory vault data types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Kind of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// A specific conversational moment
    Episodic,
    /// A fact or concept
    Semantic,
    /// An emotionally significant moment
    Emotional,
    /// How to do something
    Procedural,
    /// Blended result of a Valon/Modi turn
    Synthesis,
}

impl MemoryType {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Episodic => "episodic",
            MemoryType::Semantic => "semantic",
            MemoryType::Emotional => "emotional",
            MemoryType::Procedural => "procedural",
            MemoryType::Synthesis => "synthesis",
        }
    }
}

/// A stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique memory ID
    pub id: Uuid,
    /// Remembered text
    pub content: String,
    /// Emotional significance (0.0 - 1.0)
    pub emotional_weight: f64,
    /// Emotional label, indexed by the emotional index
    pub emotional_state: String,
    /// When the memory was created
    pub timestamp: DateTime<Utc>,
    /// Lowercase association keywords
    pub associations: BTreeSet<String>,
    /// Kind of memory
    pub memory_type: MemoryType,
    /// Retention strength (0.0 - 1.0), never lowered by consolidation
    pub consolidation_level: f64,
    /// Number of retrievals
    pub access_count: u64,
    /// Semantically related memories
    pub links: BTreeSet<Uuid>,
}

impl MemoryItem {
    /// Create a new memory with neutral emotion.
    pub fn new(content: impl Into<String>, memory_type: MemoryType) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            emotional_weight: 0.0,
            emotional_state: "neutral".to_string(),
            timestamp: Utc::now(),
            associations: BTreeSet::new(),
            memory_type,
            consolidation_level: 0.0,
            access_count: 0,
            links: BTreeSet::new(),
        }
    }

    /// Set emotional weight and label.
    pub fn with_emotion(mut self, weight: f64, state: impl Into<String>) -> Self {
        self.emotional_weight = weight;
        self.emotional_state = state.into().trim().to_lowercase();
        self
    }

    /// Add association keywords (normalized to lowercase).
    pub fn with_associations<I, S>(mut self, associations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for association in associations {
            let association = association.as_ref().trim().to_lowercase();
            if !association.is_empty() {
                self.associations.insert(association);
            }
        }
        self
    }

    /// Set the creation timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the starting consolidation level.
    pub fn with_consolidation(mut self, level: f64) -> Self {
        self.consolidation_level = level;
        self
    }

    /// Lowercase the emotional label and associations the way the builders
    /// do. Items set up through public fields or deserialized skip them.
    pub(crate) fn normalize_labels(&mut self) {
        self.emotional_state = self.emotional_state.trim().to_lowercase();
        if self.emotional_state.is_empty() {
            self.emotional_state = "neutral".to_string();
        }
        self.associations = std::mem::take(&mut self.associations)
            .into_iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
    }
}

/// Parameters for [`crate::vault::MemoryVault::search`].
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Case-insensitive text matched against content and associations
    pub text: String,
    /// Substring matched against the emotional state
    pub emotional_filter: Option<String>,
    /// Only memories created within this window
    pub timeframe: Option<Duration>,
    /// Only these memory types
    pub memory_types: Option<Vec<MemoryType>>,
    /// Maximum results
    pub limit: usize,
}

impl SearchQuery {
    /// Default result limit.
    pub const DEFAULT_LIMIT: usize = 10;

    /// Create a query for `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emotional_filter: None,
            timeframe: None,
            memory_types: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// Builder: filter by emotional state.
    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotional_filter = Some(emotion.into());
        self
    }

    /// Builder: only memories newer than `window`.
    pub fn within(mut self, window: Duration) -> Self {
        self.timeframe = Some(window);
        self
    }

    /// Builder: only the given types.
    pub fn of_types(mut self, types: Vec<MemoryType>) -> Self {
        self.memory_types = Some(types);
        self
    }

    /// Builder: result limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A search hit.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    /// The matching memory
    pub memory: MemoryItem,
    /// Relevance score
    pub relevance: f64,
}

/// Result of a store call.
#[derive(Debug, Clone)]
pub struct StoreOutcome {
    /// Id of the stored memory
    pub id: Uuid,
    /// Memories consolidated by a queue-triggered batch
    pub consolidated: usize,
    /// Memories removed by eviction
    pub evicted: Vec<Uuid>,
}

/// Aggregate vault statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultStats {
    /// Stored memories
    pub total: usize,
    /// Ids awaiting consolidation
    pub queued: usize,
    /// Count per memory type
    pub by_type: BTreeMap<MemoryType, usize>,
    /// Mean consolidation level
    pub mean_consolidation: f64,
    /// Distinct associations
    pub association_count: usize,
    /// Distinct emotional states
    pub emotional_state_count: usize,
    /// Distinct creation days
    pub day_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_builder_normalizes() {
        let memory = MemoryItem::new("We talked about stars", MemoryType::Episodic)
            .with_emotion(0.6, " Wonder ")
            .with_associations(["Stars", " astronomy", "", "stars"]);

        assert_eq!(memory.emotional_state, "wonder");
        assert_eq!(memory.associations.len(), 2);
        assert!(memory.associations.contains("stars"));
        assert!(memory.associations.contains("astronomy"));
        assert_eq!(memory.access_count, 0);
    }

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new("stars")
            .with_emotion("wonder")
            .within(Duration::days(7))
            .of_types(vec![MemoryType::Episodic])
            .limit(3);

        assert_eq!(query.limit, 3);
        assert_eq!(query.emotional_filter.as_deref(), Some("wonder"));
        assert_eq!(SearchQuery::new("x").limit, SearchQuery::DEFAULT_LIMIT);
    }
}
