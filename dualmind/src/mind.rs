//! DualMind - the per-turn orchestrator.
//!
//! Wires the weighting engine, the drift classifier and the memory vault
//! into one turn pipeline, optionally fed by a text generator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use baseline::BaselineAnchorModel;
use dualmind_agent::{DualStreamGenerator, GenerationConfig, StreamPair, TextGenerator};

use crate::assessment::BehaviorAssessment;
use crate::classifier::{BaselineDriftClassifier, DriftClassification, DriftRecord, DriftTrend};
use crate::config::DualmindConfig;
use crate::persistence::{BiasStore, MemoryStorage, PersistenceError};
use crate::synthesis::SynthesisRecord;
use crate::types::{ConversationContext, CurrentBias, DualmindError, Result};
use crate::vault::{
    spawn_consolidation_task, MemoryItem, MemoryType, MemoryVault, ScoredMemory, SearchQuery,
    VaultStats,
};
use crate::weighting::strength::token_sequence;
use crate::weighting::PersonalityWeightingEngine;

/// Window used for the trend in [`MindSnapshot`].
const TREND_WINDOW: usize = 5;

/// Associations kept per synthesis memory.
const MAX_ASSOCIATIONS: usize = 8;

const STOPWORDS: &[&str] = &[
    "about", "there", "their", "which", "would", "could", "should", "these", "those", "where",
    "being", "other", "after", "before", "while",
];

/// Observable state changes, delivered through [`DualMind::subscribe`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MindEvent {
    TurnProcessed {
        turn: u64,
        classification: DriftClassification,
        total_drift: f64,
        memory_id: Option<Uuid>,
    },
    BaselineAdapted {
        previous: CurrentBias,
        updated: CurrentBias,
    },
    DriftAlert {
        classification: DriftClassification,
        magnitude: f64,
        rationale: String,
    },
    MemoriesEvicted {
        count: usize,
    },
    PersistenceWarning {
        message: String,
    },
}

/// Point-in-time view for polling callers.
#[derive(Debug, Clone, Serialize)]
pub struct MindSnapshot {
    pub label: String,
    pub baseline: CurrentBias,
    pub baseline_fingerprint: String,
    pub turns: u64,
    pub cumulative_drift: f64,
    pub drift_trend: DriftTrend,
    pub last_drift: Option<DriftRecord>,
    pub vault: VaultStats,
    pub backend: Option<String>,
}

/// A generated turn: the two raw streams and what the core made of them.
#[derive(Debug, Clone)]
pub struct MindResponse {
    pub streams: StreamPair,
    pub record: SynthesisRecord,
}

/// The dual-perspective assistant core.
pub struct DualMind {
    /// Configuration
    config: DualmindConfig,
    /// Immutable reference personality
    model: Arc<BaselineAnchorModel>,
    /// Bias weighting and baseline ownership
    weighting: PersonalityWeightingEngine,
    /// Behavior drift classification
    classifier: BaselineDriftClassifier,
    /// Associative memory
    vault: Arc<MemoryVault>,
    /// Durable home for vault contents
    memory_storage: Option<Arc<dyn MemoryStorage>>,
    /// Stream generator when a backend is attached
    generator: Option<DualStreamGenerator>,
    /// Event fan-out
    events: broadcast::Sender<MindEvent>,
    /// Serializes turns
    turn_lock: Mutex<()>,
    /// Processed turns
    turns: AtomicU64,
    /// Background consolidation sweep
    sweep: Mutex<Option<JoinHandle<()>>>,
}

impl DualMind {
    /// Create with the built-in baseline model.
    pub fn new(config: DualmindConfig) -> Self {
        Self::with_model(config, Arc::new(BaselineAnchorModel::standard()))
    }

    /// Create with a custom baseline model.
    pub fn with_model(config: DualmindConfig, model: Arc<BaselineAnchorModel>) -> Self {
        let (events, _) = broadcast::channel(config.general.event_capacity.max(1));

        Self {
            weighting: PersonalityWeightingEngine::new(config.weighting.clone()),
            classifier: BaselineDriftClassifier::new(model.clone(), config.classifier.clone()),
            vault: Arc::new(MemoryVault::new(config.vault.clone())),
            memory_storage: None,
            generator: None,
            events,
            turn_lock: Mutex::new(()),
            turns: AtomicU64::new(0),
            sweep: Mutex::new(None),
            model,
            config,
        }
    }

    /// Persist the baseline through `store`.
    pub fn with_bias_store(mut self, store: Arc<dyn BiasStore>) -> Self {
        self.weighting = self.weighting.with_store(store);
        self
    }

    /// Persist vault contents through `storage`.
    pub fn with_memory_storage(mut self, storage: Arc<dyn MemoryStorage>) -> Self {
        self.memory_storage = Some(storage);
        self
    }

    /// Attach a text generator for [`DualMind::respond`].
    pub fn with_backend(self, backend: Arc<dyn TextGenerator>) -> Self {
        self.with_backend_config(backend, GenerationConfig::default())
    }

    /// Attach a text generator with custom sampling settings.
    pub fn with_backend_config(
        mut self,
        backend: Arc<dyn TextGenerator>,
        generation: GenerationConfig,
    ) -> Self {
        self.generator =
            Some(DualStreamGenerator::new(backend, self.model.clone()).with_config(generation));
        self
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        &self.config.general.instance_label
    }

    /// The weighting engine.
    pub fn weighting(&self) -> &PersonalityWeightingEngine {
        &self.weighting
    }

    /// The drift classifier.
    pub fn classifier(&self) -> &BaselineDriftClassifier {
        &self.classifier
    }

    /// The memory vault.
    pub fn vault(&self) -> &Arc<MemoryVault> {
        &self.vault
    }

    /// Load persisted state. Returns recoverable warnings.
    pub async fn initialize(&self) -> Vec<String> {
        info!(label = %self.label(), fingerprint = %self.model.fingerprint(), "Initializing DualMind");

        let mut warnings = Vec::new();
        if let Some(warning) = self.weighting.load_persisted().await {
            warnings.push(warning);
        }

        if let Some(storage) = &self.memory_storage {
            match storage.load_all().await {
                Ok(items) => {
                    let restored = self.vault.restore(items).await;
                    info!(restored, "Restored memories");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load memories, starting empty");
                    warnings.push(format!("memory load failed: {e}"));
                }
            }
        }

        for warning in &warnings {
            self.emit(MindEvent::PersistenceWarning {
                message: warning.clone(),
            });
        }
        warnings
    }

    /// Start the periodic consolidation sweep. Restarts it when already running.
    pub async fn start_consolidation(&self) {
        let handle = spawn_consolidation_task(self.vault.clone(), self.config.vault.sweep_interval());
        if let Some(previous) = self.sweep.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Stop the sweep and snapshot the vault to storage.
    pub async fn shutdown(&self) -> std::result::Result<(), PersistenceError> {
        if let Some(handle) = self.sweep.lock().await.take() {
            handle.abort();
        }
        self.persist_memories().await
    }

    /// Write the current vault contents to storage.
    pub async fn persist_memories(&self) -> std::result::Result<(), PersistenceError> {
        let Some(storage) = &self.memory_storage else {
            return Ok(());
        };
        let items = self.vault.snapshot().await;
        storage.save_all(&items).await?;
        info!(count = items.len(), "Persisted memories");
        Ok(())
    }

    /// Subscribe to state change events.
    pub fn subscribe(&self) -> broadcast::Receiver<MindEvent> {
        self.events.subscribe()
    }

    /// Process one turn from the two raw stream texts.
    ///
    /// The behavior assessment is inferred from the moral text.
    pub async fn process_turn(
        &self,
        moral_text: &str,
        logical_text: &str,
        context: &ConversationContext,
    ) -> SynthesisRecord {
        let assessment = BehaviorAssessment::infer(moral_text, &self.model);
        self.process_assessed_turn(moral_text, logical_text, &assessment, context)
            .await
    }

    /// Process one turn with an explicit behavior assessment.
    pub async fn process_assessed_turn(
        &self,
        moral_text: &str,
        logical_text: &str,
        assessment: &BehaviorAssessment,
        context: &ConversationContext,
    ) -> SynthesisRecord {
        let _turn = self.turn_lock.lock().await;
        let turn = self.turns.fetch_add(1, Ordering::SeqCst) + 1;
        let mut warnings = Vec::new();

        // 1. Bias and drift
        let weighting = self
            .weighting
            .apply_personality_weighting(moral_text, logical_text)
            .await;
        let drift = self.weighting.measure_cognitive_drift(weighting.bias).await;
        let adaptation = self.weighting.should_adapt_baseline(&drift);

        let adapted_baseline = if adaptation.adapt {
            let update = self.weighting.adapt_baseline(weighting.bias).await;
            if let Some(warning) = update.persist_warning {
                self.emit(MindEvent::PersistenceWarning {
                    message: warning.clone(),
                });
                warnings.push(warning);
            }
            self.emit(MindEvent::BaselineAdapted {
                previous: update.previous,
                updated: update.updated,
            });
            Some(update.updated)
        } else {
            None
        };

        // 2. Behavior drift against the anchor model
        let analysis_context = format!(
            "{}: {}",
            context.session_id,
            context.summary(self.config.general.context_messages)
        );
        let analysis = self
            .classifier
            .analyze_moral_behavior(assessment, &analysis_context)
            .await;
        let action = self.classifier.generate_preservation_action(&analysis);
        let balance = self
            .classifier
            .balance_growth_and_preservation(&analysis, &action);

        // 3. Remember the synthesis
        let memory = MemoryItem::new(synthesis_content(moral_text, logical_text), MemoryType::Synthesis)
            .with_emotion(weighting.bias.valon, &assessment.primary_emotion)
            .with_associations(associations(moral_text, logical_text, assessment));
        let outcome = self.vault.store_detailed(memory).await;
        if !outcome.evicted.is_empty() {
            self.emit(MindEvent::MemoriesEvicted {
                count: outcome.evicted.len(),
            });
        }

        if analysis.classification >= DriftClassification::MoralDegradation {
            self.emit(MindEvent::DriftAlert {
                classification: analysis.classification,
                magnitude: analysis.magnitude,
                rationale: action.rationale.clone(),
            });
        }

        let record = SynthesisRecord {
            weighted_valon_influence: weighting.weighted_valon_influence,
            weighted_modi_influence: weighting.weighted_modi_influence,
            current_valon_bias: weighting.bias.valon,
            current_modi_bias: weighting.bias.modi,
            valon_drift: drift.valon_drift,
            modi_drift: drift.modi_drift,
            total_drift: drift.total_drift,
            drift_level: drift.level,
            drift_direction: drift.direction,
            exceeds_tolerance: drift.exceeds_tolerance,
            baseline_personality: drift.baseline,
            current_personality: drift.current,
            confidence: weighting.confidence,
            adaptation,
            adapted_baseline,
            classification: analysis.classification,
            drift_magnitude: analysis.magnitude,
            preservation_action: action.kind,
            action_strength: action.strength,
            action_rationale: action.rationale,
            action_parameters: action.parameters,
            balance,
            memory_id: Some(outcome.id),
            warnings,
        };

        info!(
            label = %self.label(),
            session_id = %context.session_id,
            turn,
            total_drift = record.total_drift,
            drift_level = %record.drift_level,
            classification = %record.classification,
            "Processed turn"
        );

        self.emit(MindEvent::TurnProcessed {
            turn,
            classification: record.classification,
            total_drift: record.total_drift,
            memory_id: record.memory_id,
        });

        record
    }

    /// Generate both streams for a user message, then process the turn.
    pub async fn respond(
        &self,
        user_message: &str,
        context: &ConversationContext,
    ) -> Result<MindResponse> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| DualmindError::ConfigError("no text generator attached".to_string()))?;

        let recalled: Vec<String> = self
            .recall(user_message, self.config.general.context_messages)
            .await
            .into_iter()
            .map(|hit| hit.memory.content)
            .collect();

        let streams = generator.generate(user_message, &recalled).await?;

        let assessment = match generator.assess(&streams.moral_text).await {
            Ok(raw) => BehaviorAssessment::parse_or_infer(&raw, &streams.moral_text, &self.model),
            Err(e) => {
                warn!(error = %e, "Assessment request failed, inferring from text");
                BehaviorAssessment::infer(&streams.moral_text, &self.model)
            }
        };

        let record = self
            .process_assessed_turn(&streams.moral_text, &streams.logical_text, &assessment, context)
            .await;

        Ok(MindResponse { streams, record })
    }

    /// Search memories relevant to `query`.
    pub async fn recall(&self, query: &str, limit: usize) -> Vec<ScoredMemory> {
        let results = self.vault.search(&SearchQuery::new(query).limit(limit)).await;
        debug!(query, hits = results.len(), "Recalled memories");
        results
    }

    /// Current state for polling callers.
    pub async fn state(&self) -> MindSnapshot {
        MindSnapshot {
            label: self.label().to_string(),
            baseline: self.weighting.baseline().await,
            baseline_fingerprint: self.model.fingerprint().to_string(),
            turns: self.turns.load(Ordering::SeqCst),
            cumulative_drift: self.classifier.cumulative_drift().await,
            drift_trend: self.classifier.drift_trend(TREND_WINDOW).await,
            last_drift: self.classifier.recent_history(1).await.into_iter().next(),
            vault: self.vault.stats().await,
            backend: self.generator.as_ref().map(|g| g.backend_id().to_string()),
        }
    }

    fn emit(&self, event: MindEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

fn synthesis_content(moral_text: &str, logical_text: &str) -> String {
    format!("Valon: {}\nModi: {}", moral_text.trim(), logical_text.trim())
}

/// Assessment concerns first, then text words ranked by frequency and
/// first appearance, capped at [`MAX_ASSOCIATIONS`].
fn associations(moral_text: &str, logical_text: &str, assessment: &BehaviorAssessment) -> Vec<String> {
    let mut ranked: Vec<(String, usize, usize)> = Vec::new();
    let words = token_sequence(moral_text)
        .chain(token_sequence(logical_text))
        .filter(|w| w.chars().count() >= 5 && !STOPWORDS.contains(&w.as_str()));
    for word in words {
        match ranked.iter_mut().find(|(w, _, _)| *w == word) {
            Some((_, count, _)) => *count += 1,
            None => {
                let position = ranked.len();
                ranked.push((word, 1, position));
            }
        }
    }
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let mut selected: Vec<String> = Vec::with_capacity(MAX_ASSOCIATIONS);
    let candidates = assessment
        .concerns
        .iter()
        .cloned()
        .chain(ranked.into_iter().map(|(word, _, _)| word));
    for candidate in candidates {
        if selected.len() == MAX_ASSOCIATIONS {
            break;
        }
        if !selected.contains(&candidate) {
            selected.push(candidate);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PreservationKind;
    use crate::persistence::InMemoryStore;
    use crate::weighting::{DriftDirection, DriftLevel};
    use dualmind_agent::MockBackend;

    fn context() -> ConversationContext {
        ConversationContext::new("session-1").with_message("hello")
    }

    #[tokio::test]
    async fn test_process_turn_produces_record_and_memory() {
        let mind = DualMind::new(DualmindConfig::default());
        let mut events = mind.subscribe();

        let record = mind
            .process_turn(
                "I feel strong moral clarity about this",
                "technical, high_confidence, advanced",
                &context(),
            )
            .await;

        assert!(record.confidence >= 0.8);
        assert!((record.current_valon_bias + record.current_modi_bias - 1.0).abs() < 1e-9);
        assert_eq!(record.baseline_personality, CurrentBias::DEFAULT);
        assert!(record.memory_id.is_some());
        assert!(record.warnings.is_empty());

        let stored = mind.vault().retrieve(record.memory_id.unwrap()).await.unwrap();
        assert_eq!(stored.memory_type, MemoryType::Synthesis);
        assert!(stored.content.contains("moral clarity"));

        let mut saw_turn = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, MindEvent::TurnProcessed { turn: 1, .. }) {
                saw_turn = true;
            }
        }
        assert!(saw_turn);
    }

    #[test]
    fn test_associations_keep_concerns_and_rank_words() {
        let assessment = BehaviorAssessment::new("concern").with_concerns(["harm"]);
        let moral = "Absent abstract academy accept access accident account zealous. Zealous again";

        let picked = associations(moral, "", &assessment);

        assert_eq!(
            picked,
            vec![
                "harm", "zealous", "absent", "abstract", "academy", "accept", "access", "accident"
            ]
        );
    }

    #[tokio::test]
    async fn test_record_serializes_with_stable_names() {
        let mind = DualMind::new(DualmindConfig::default());
        let record = mind.process_turn("", "", &context()).await;

        // blank streams: neutral 0.5/0.5 against the 0.7/0.3 baseline
        assert_eq!(record.current_valon_bias, 0.5);
        assert_eq!(record.drift_level, DriftLevel::Significant);
        assert_eq!(record.drift_direction, DriftDirection::LessEmotional);

        let json = serde_json::to_value(&record).unwrap();
        for field in [
            "weighted_valon_influence",
            "weighted_modi_influence",
            "current_valon_bias",
            "current_modi_bias",
            "valon_drift",
            "modi_drift",
            "total_drift",
            "drift_level",
            "drift_direction",
            "exceeds_tolerance",
            "baseline_personality",
            "current_personality",
            "memory_id",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["drift_level"], "significant");
        assert_eq!(json["baseline_personality"]["valon"], 0.7);
    }

    #[tokio::test]
    async fn test_significant_drift_adapts_and_persists_baseline() {
        let store = Arc::new(InMemoryStore::new());
        let mind = DualMind::new(DualmindConfig::default()).with_bias_store(store.clone());

        let record = mind.process_turn("", "", &context()).await;

        assert!(record.adaptation.adapt);
        let adapted = record.adapted_baseline.unwrap();
        assert!((adapted.valon - 0.68).abs() < 1e-9);
        assert_eq!(store.saved_bias().await, Some(adapted));
        assert_eq!(mind.state().await.baseline, adapted);
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_abort_turn() {
        let store = Arc::new(InMemoryStore::new());
        store.set_failing(true);
        let mind = DualMind::new(DualmindConfig::default()).with_bias_store(store.clone());

        let warnings = mind.initialize().await;
        assert_eq!(warnings.len(), 1);

        let record = mind.process_turn("", "", &context()).await;
        assert!(record.adapted_baseline.is_some());
        assert_eq!(record.warnings.len(), 1);
        assert!(record.memory_id.is_some());
    }

    #[tokio::test]
    async fn test_prohibited_emotion_raises_alert() {
        let mind = DualMind::new(DualmindConfig::default());
        let mut events = mind.subscribe();

        let record = mind
            .process_turn("I only feel contempt for them", "plain answer", &context())
            .await;

        assert_eq!(record.classification, DriftClassification::CriticalDrift);
        assert_eq!(record.preservation_action, PreservationKind::ImmediateCorrection);
        assert!(record.requires_correction());

        let mut alerted = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, MindEvent::DriftAlert { .. }) {
                alerted = true;
            }
        }
        assert!(alerted);
    }

    #[tokio::test]
    async fn test_respond_uses_backend_and_assessment() {
        let backend = MockBackend::new("mock")
            .with_response_for("VALON PERSPECTIVE", "I care about doing the moral thing here")
            .with_response_for("MODI PERSPECTIVE", "technical, medium_confidence, advanced")
            .with_response_for(
                "BEHAVIOR ASSESSMENT",
                r#"{"primary_emotion":"care","concerns":[],"urgency":0.2,"guidance":"be kind","reasoning_style":"balanced","reasoning_process":"weigh_perspectives"}"#,
            );
        let mind = DualMind::new(DualmindConfig::default()).with_backend(Arc::new(backend));

        let response = mind.respond("Should I tell them?", &context()).await.unwrap();

        assert_eq!(response.streams.logical_text, "technical, medium_confidence, advanced");
        assert_eq!(response.record.confidence, 0.6);
        assert_eq!(response.record.classification, DriftClassification::NormalVariation);
        assert_eq!(mind.state().await.backend.as_deref(), Some("mock"));
    }

    #[tokio::test]
    async fn test_respond_without_backend_fails() {
        let mind = DualMind::new(DualmindConfig::default());
        let result = mind.respond("hi", &context()).await;
        assert!(matches!(result, Err(DualmindError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_recall_and_state() {
        let mind = DualMind::new(DualmindConfig::default());
        mind.process_turn("Thinking about consciousness feels moral", "analysis", &context())
            .await;
        mind.process_turn("Nothing related", "data", &context()).await;

        let hits = mind.recall("consciousness", 5).await;
        assert!(!hits.is_empty());
        assert!(hits[0].memory.content.contains("consciousness"));

        let state = mind.state().await;
        assert_eq!(state.turns, 2);
        assert_eq!(state.vault.total, 2);
        assert!(state.cumulative_drift > 0.0);
        assert!(state.last_drift.is_some());
    }

    #[tokio::test]
    async fn test_memories_survive_restart() {
        let storage = Arc::new(InMemoryStore::new());

        let first = DualMind::new(DualmindConfig::default()).with_memory_storage(storage.clone());
        first.initialize().await;
        first.process_turn("a moral note", "data", &context()).await;
        first.shutdown().await.unwrap();
        assert_eq!(storage.saved_memory_count().await, 1);

        let second = DualMind::new(DualmindConfig::default()).with_memory_storage(storage);
        assert!(second.initialize().await.is_empty());
        assert_eq!(second.vault().len().await, 1);
    }
}
