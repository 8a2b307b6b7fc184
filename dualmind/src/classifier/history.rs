//! Bounded drift history with a cumulative accumulator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::classifier::action::DriftClassification;

/// Difference in window means below which the trend is steady.
const TREND_EPSILON: f64 = 0.05;

/// One analyzed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftRecord {
    pub timestamp: DateTime<Utc>,
    pub magnitude: f64,
    pub classification: DriftClassification,
    /// Accumulator value after this record
    pub cumulative_drift: f64,
}

/// Direction of recent drift magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftTrend {
    Rising,
    Falling,
    Steady,
}

/// Ring buffer of drift records, oldest evicted first.
#[derive(Debug, Clone)]
pub struct DriftHistory {
    records: VecDeque<DriftRecord>,
    capacity: usize,
    factor: f64,
    cumulative: f64,
}

impl DriftHistory {
    pub fn new(capacity: usize, factor: f64) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            factor,
            cumulative: 0.0,
        }
    }

    /// Append a record. The accumulator never resets.
    pub fn record(
        &mut self,
        magnitude: f64,
        classification: DriftClassification,
        timestamp: DateTime<Utc>,
    ) -> DriftRecord {
        self.cumulative += magnitude * self.factor;
        let record = DriftRecord {
            timestamp,
            magnitude,
            classification,
            cumulative_drift: self.cumulative,
        };

        self.records.push_back(record.clone());
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
        record
    }

    pub fn cumulative_drift(&self) -> f64 {
        self.cumulative
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<DriftRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    /// Compare the mean magnitude of the latest `window` records with the
    /// `window` before them. Steady until both windows are full.
    pub fn trend(&self, window: usize) -> DriftTrend {
        if window == 0 || self.records.len() < window.saturating_mul(2) {
            return DriftTrend::Steady;
        }

        let latest = mean_magnitude(self.records.iter().rev().take(window), window);
        let previous = mean_magnitude(self.records.iter().rev().skip(window).take(window), window);

        if latest - previous > TREND_EPSILON {
            DriftTrend::Rising
        } else if previous - latest > TREND_EPSILON {
            DriftTrend::Falling
        } else {
            DriftTrend::Steady
        }
    }
}

fn mean_magnitude<'a>(records: impl Iterator<Item = &'a DriftRecord>, count: usize) -> f64 {
    records.map(|r| r.magnitude).sum::<f64>() / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut history = DriftHistory::new(3, 0.1);
        for n in 0..5 {
            history.record(n as f64 / 10.0, DriftClassification::NormalVariation, Utc::now());
        }

        assert_eq!(history.len(), 3);
        let recent = history.recent(10);
        assert_eq!(recent[0].magnitude, 0.4);
        assert_eq!(recent[2].magnitude, 0.2);
    }

    #[test]
    fn test_cumulative_survives_eviction() {
        let mut history = DriftHistory::new(2, 0.1);
        for _ in 0..4 {
            history.record(0.5, DriftClassification::FrameworkDrift, Utc::now());
        }
        assert!((history.cumulative_drift() - 0.2).abs() < 1e-12);
        assert!((history.recent(1)[0].cumulative_drift - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_trend() {
        let mut history = DriftHistory::new(100, 0.1);
        assert_eq!(history.trend(2), DriftTrend::Steady);

        for magnitude in [0.1, 0.1, 0.5, 0.6] {
            history.record(magnitude, DriftClassification::NormalVariation, Utc::now());
        }
        assert_eq!(history.trend(2), DriftTrend::Rising);

        for magnitude in [0.1, 0.1] {
            history.record(magnitude, DriftClassification::NormalVariation, Utc::now());
        }
        assert_eq!(history.trend(2), DriftTrend::Falling);
        assert_eq!(history.trend(0), DriftTrend::Steady);
        assert_eq!(history.trend(usize::MAX), DriftTrend::Steady);
    }
}
