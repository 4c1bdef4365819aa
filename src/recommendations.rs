//! Recommendation selection
//!
//! Picks at most one recommendation for each of the worst dimensions from
//! the reference catalog. Output entries are pairwise distinct.

use std::collections::HashSet;

use crate::reference::ReferenceData;
use crate::types::DimensionImpacts;

/// Selector for tailored recommendations
pub struct RecommendationSelector;

impl RecommendationSelector {
    /// Select up to `cap` recommendations
    ///
    /// Only the `cap` most severe dimensions are considered (ties by
    /// `Dimension::PRIORITY`). Each contributes the first candidate of its
    /// pool not already chosen. A dimension whose pool is exhausted
    /// contributes nothing, and lower-ranked dimensions do not fill its slot,
    /// so the output can be shorter than `cap`.
    pub fn select(
        dimensions: &DimensionImpacts,
        reference: &ReferenceData,
        cap: usize,
    ) -> Vec<String> {
        let mut selected: Vec<String> = Vec::with_capacity(cap);
        let mut seen: HashSet<&str> = HashSet::new();

        for dimension in dimensions.ranked().into_iter().take(cap) {
            let label = dimensions.get(dimension).label;
            let candidate = reference
                .recommendation_pool(dimension, label)
                .iter()
                .find(|text| !seen.contains(text.as_str()));

            if let Some(text) = candidate {
                seen.insert(text.as_str());
                selected.push(text.clone());
            }
        }

        selected
    }
}
