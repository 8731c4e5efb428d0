//! `graph.growthMetrics` — per-epoch relationship-growth bookkeeping.
//!
//! Open Question 2 (spec.md §9) leaves `averageGrowthRate`'s smoothing
//! window unspecified; DESIGN.md records the decision: a domain-configurable
//! windowed mean over per-epoch relationship counts, defaulting to 10
//! epochs.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthMetrics {
    window_size: usize,
    per_epoch_relationship_counts: VecDeque<usize>,
    pub target_vs_actual: std::collections::BTreeMap<String, (usize, usize)>,
}

impl GrowthMetrics {
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            per_epoch_relationship_counts: VecDeque::new(),
            target_vs_actual: std::collections::BTreeMap::new(),
        }
    }

    pub fn record_epoch_relationship_count(&mut self, count: usize) {
        self.per_epoch_relationship_counts.push_back(count);
        while self.per_epoch_relationship_counts.len() > self.window_size {
            self.per_epoch_relationship_counts.pop_front();
        }
    }

    /// Windowed mean relationship growth per epoch over the configured
    /// window.
    #[must_use]
    pub fn average_growth_rate(&self) -> f64 {
        if self.per_epoch_relationship_counts.is_empty() {
            return 0.0;
        }
        let sum: usize = self.per_epoch_relationship_counts.iter().sum();
        sum as f64 / self.per_epoch_relationship_counts.len() as f64
    }

    /// Variance of the windowed relationship-growth samples, used by the
    /// stability score (§4.11).
    #[must_use]
    pub fn growth_variance(&self) -> f64 {
        let n = self.per_epoch_relationship_counts.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.average_growth_rate();
        let sum_sq: f64 = self
            .per_epoch_relationship_counts
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum();
        sum_sq / n as f64
    }
}

impl Default for GrowthMetrics {
    fn default() -> Self {
        Self::new(10)
    }
}
