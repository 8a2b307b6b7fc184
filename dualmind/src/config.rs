//! Configuration for the dualmind core.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::types::CurrentBias;

/// Configuration for a [`crate::DualMind`] instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DualmindConfig {
    /// Personality weighting configuration
    pub weighting: WeightingConfig,
    /// Drift classifier configuration
    pub classifier: ClassifierConfig,
    /// Memory vault configuration
    pub vault: VaultConfig,
    /// General settings
    pub general: GeneralConfig,
}

impl DualmindConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load config from YAML, falling back to defaults when it cannot be parsed.
    pub fn from_yaml_or_default(yaml: &str) -> Self {
        match Self::from_yaml(yaml) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Malformed configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Raw bias ratios as injected by configuration.
///
/// Values are kept raw so a malformed entry can be detected and replaced at
/// use time instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasRatios {
    pub valon: f64,
    pub modi: f64,
}

impl BiasRatios {
    /// Normalized bias, or the 0.7/0.3 default when the ratios are unusable.
    pub fn validated(&self) -> CurrentBias {
        match CurrentBias::normalized(self.valon, self.modi) {
            Some(bias) => bias,
            None => {
                warn!(
                    valon = self.valon,
                    modi = self.modi,
                    "Invalid bias ratios in configuration, using default 0.7/0.3"
                );
                CurrentBias::DEFAULT
            }
        }
    }
}

impl Default for BiasRatios {
    fn default() -> Self {
        Self {
            valon: CurrentBias::DEFAULT.valon,
            modi: CurrentBias::DEFAULT.modi,
        }
    }
}

/// Personality weighting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    /// Starting baseline when nothing is persisted
    pub default_bias: BiasRatios,
    /// Pull weights toward an even blend when the streams agree
    pub adaptive_weighting: bool,
    /// Drift tolerance (sum of absolute deltas)
    pub drift_tolerance: f64,
    /// Exponential smoothing rate for baseline adaptation
    pub adaptation_rate: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            default_bias: BiasRatios::default(),
            adaptive_weighting: true,
            drift_tolerance: 0.3,
            adaptation_rate: 0.1,
        }
    }
}

impl WeightingConfig {
    /// Tolerance, replaced by the default when not a positive finite number.
    pub fn effective_tolerance(&self) -> f64 {
        if self.drift_tolerance.is_finite() && self.drift_tolerance > 0.0 {
            self.drift_tolerance
        } else {
            warn!(tolerance = self.drift_tolerance, "Invalid drift tolerance, using 0.3");
            0.3
        }
    }

    /// Adaptation rate clamped to [0, 1].
    pub fn effective_rate(&self) -> f64 {
        if self.adaptation_rate.is_finite() {
            self.adaptation_rate.clamp(0.0, 1.0)
        } else {
            warn!(rate = self.adaptation_rate, "Invalid adaptation rate, using 0.1");
            0.1
        }
    }
}

/// Drift classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Maximum drift records kept
    pub history_capacity: usize,
    /// Fraction of each turn's magnitude added to cumulative drift
    pub cumulative_factor: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            cumulative_factor: 0.1,
        }
    }
}

/// Memory vault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Capacity before eviction runs
    pub max_memories: usize,
    /// Memories below this level are queued for consolidation
    pub consolidation_threshold: f64,
    /// Consolidation queue capacity
    pub queue_capacity: usize,
    /// Ids consolidated per batch
    pub batch_size: usize,
    /// Access timestamps kept per memory
    pub access_history_limit: usize,
    /// Maximum semantic links per memory
    pub max_links: usize,
    /// Extra fraction of capacity freed by each eviction
    pub eviction_headroom: f64,
    /// Days over which recency decays to zero
    pub recency_window_days: i64,
    /// Seconds between background consolidation sweeps
    pub sweep_interval_secs: u64,
    /// Accesses newer than this earn a search bonus (seconds)
    pub recent_access_window_secs: i64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_memories: 10_000,
            consolidation_threshold: 0.8,
            queue_capacity: 100,
            batch_size: 10,
            access_history_limit: 100,
            max_links: 5,
            eviction_headroom: 0.05,
            recency_window_days: 30,
            sweep_interval_secs: 300,
            recent_access_window_secs: 3600,
        }
    }
}

impl VaultConfig {
    /// Sweep interval as a duration (never zero).
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// General configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Label used in logs
    pub instance_label: String,
    /// Buffered events per subscriber
    pub event_capacity: usize,
    /// History messages folded into the analysis context
    pub context_messages: usize,
    /// Log level hint for the embedding application
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            instance_label: "dualmind".to_string(),
            event_capacity: 64,
            context_messages: 3,
            log_level: "info".to_string(),
        }
    }
}
