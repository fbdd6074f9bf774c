// Weight Registry
// Owns the dimension -> weight mapping. Updates are validated against the
// sum-to-1.0 invariant and committed atomically; reads over an enabled
// subset are renormalized so the returned weights always sum to 1.0.

use crate::error::ConfigurationError;
use crate::services::analysis::dimension::{default_weights, DimensionId};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::info;

/// Allowed deviation of the full weight table from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

pub struct WeightRegistry {
    weights: RwLock<BTreeMap<DimensionId, f64>>,
}

impl Default for WeightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightRegistry {
    pub fn new() -> Self {
        Self {
            weights: RwLock::new(default_weights()),
        }
    }

    /// Snapshot of the full weight table.
    pub fn all(&self) -> BTreeMap<DimensionId, f64> {
        self.weights.read().expect("weights lock poisoned").clone()
    }

    /// Weights renormalized over the enabled subset, summing to 1.0.
    /// An empty subset yields an empty map; the caller must then fall
    /// back to the neutral overall score instead of dividing by zero.
    pub fn weights_for(&self, enabled: &[DimensionId]) -> BTreeMap<DimensionId, f64> {
        let weights = self.weights.read().expect("weights lock poisoned");
        let subset: BTreeMap<DimensionId, f64> = enabled
            .iter()
            .filter_map(|d| weights.get(d).map(|w| (*d, *w)))
            .collect();

        let total: f64 = subset.values().sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        subset.into_iter().map(|(d, w)| (d, w / total)).collect()
    }

    /// Replace weights for the given dimensions. The merged table must
    /// sum to 1.0 within tolerance or the whole update is rejected and
    /// no state changes.
    pub fn update(
        &self,
        new_weights: &BTreeMap<DimensionId, f64>,
    ) -> Result<(), ConfigurationError> {
        let mut weights = self.weights.write().expect("weights lock poisoned");

        let mut candidate = weights.clone();
        for (dim, weight) in new_weights {
            candidate.insert(*dim, *weight);
        }

        let total: f64 = candidate.values().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightSum {
                total,
                tolerance: WEIGHT_SUM_TOLERANCE,
            });
        }

        *weights = candidate;
        info!(total = total, "dimension weights updated");
        Ok(())
    }

    /// Parse-and-update entry point for string-keyed weight maps coming
    /// from config files or API callers.
    pub fn update_named(
        &self,
        new_weights: &BTreeMap<String, f64>,
    ) -> Result<(), ConfigurationError> {
        let mut parsed = BTreeMap::new();
        for (name, weight) in new_weights {
            let dim = DimensionId::parse(name)
                .ok_or_else(|| ConfigurationError::UnknownDimension(name.clone()))?;
            parsed.insert(dim, *weight);
        }
        self.update(&parsed)
    }
}
