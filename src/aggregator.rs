//! Score aggregation
//!
//! Combines the six dimension severities into the inverse-impact total shown
//! to parents, and renders the headline for the worst dimension.

use crate::config::DimensionWeights;
use crate::reference::{ReferenceData, SCORE_PLACEHOLDER, SUBJECT_PLACEHOLDER};
use crate::types::{Dimension, DimensionImpacts, NormalizedInput};

/// Total reserved for "no adverse impact"; ordinary totals stop at 99
pub const NO_IMPACT_SENTINEL: u8 = 100;

/// Aggregate view of the six dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub total_score: u8,
    pub below_average: bool,
    pub shock_phrase: String,
}

/// Aggregator for dimension impacts
pub struct ImpactAggregator;

impl ImpactAggregator {
    /// Combine dimension impacts into the total score and shock phrase
    ///
    /// `no_adverse_impact` selects the sentinel (see [`no_adverse_impact`]).
    /// It does not look at the dimension labels: minute increments are
    /// absolute, so an older child at the age average can sit in the
    /// moderate band on screen time alone.
    pub fn aggregate(
        dimensions: &DimensionImpacts,
        no_adverse_impact: bool,
        weights: &DimensionWeights,
        reference: &ReferenceData,
    ) -> Aggregate {
        let total_score = if no_adverse_impact {
            NO_IMPACT_SENTINEL
        } else {
            inverse_impact(dimensions, weights).min(NO_IMPACT_SENTINEL - 1)
        };

        Aggregate {
            total_score,
            below_average: no_adverse_impact,
            shock_phrase: shock_phrase(dimensions, reference),
        }
    }
}

/// Sentinel condition: usage at or below the age average and no adverse answer
///
/// Raising any signal can only turn this from true to false, so the total
/// stays non-increasing in every answer.
pub fn no_adverse_impact(input: &NormalizedInput, usage_at_or_below_average: bool) -> bool {
    usage_at_or_below_average && !input.has_adverse_answers()
}

/// `100 - round(Σ weight_d × score_d)`, clamped to `[0, 100]`
pub fn inverse_impact(dimensions: &DimensionImpacts, weights: &DimensionWeights) -> u8 {
    let weighted: f64 = dimensions
        .iter()
        .map(|(dimension, impact)| weights.weight(dimension) * impact.score as f64)
        .sum();
    (100.0 - weighted.round()).clamp(0.0, 100.0) as u8
}

/// Dimension with the highest severity (ties resolved by `Dimension::PRIORITY`)
pub fn worst_dimension(dimensions: &DimensionImpacts) -> Dimension {
    dimensions
        .ranked()
        .first()
        .copied()
        .unwrap_or(Dimension::PRIORITY[0])
}

/// Render the shock phrase template for the worst dimension
pub fn shock_phrase(dimensions: &DimensionImpacts, reference: &ReferenceData) -> String {
    let worst = worst_dimension(dimensions);
    let impact = dimensions.get(worst);
    reference
        .shock_template(impact.label)
        .replace(SUBJECT_PLACEHOLDER, worst.subject())
        .replace(SCORE_PLACEHOLDER, &impact.score.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BedtimeFrequency, BehavioralFlags, DimensionImpact, ImpactLabel, ScreenMinutes,
        SignalLevel,
    };
    use pretty_assertions::assert_eq;

    fn impact(score: u8) -> DimensionImpact {
        DimensionImpact {
            score,
            label: ImpactLabel::from_score(score),
            descriptor: String::new(),
        }
    }

    fn impacts(scores: [u8; 6]) -> DimensionImpacts {
        // Order: sleep, physical, attention, academic, family, social
        DimensionImpacts {
            sleep_impact: impact(scores[0]),
            physical_health_impact: impact(scores[1]),
            attention_impact: impact(scores[2]),
            academic_impact: impact(scores[3]),
            family_impact: impact(scores[4]),
            social_impact: impact(scores[5]),
        }
    }

    #[test]
    fn test_inverse_impact_equal_weights() {
        let weights = DimensionWeights::default();

        assert_eq!(inverse_impact(&impacts([0; 6]), &weights), 100);
        assert_eq!(inverse_impact(&impacts([100; 6]), &weights), 0);
        // Mean 50 → 50
        assert_eq!(inverse_impact(&impacts([20, 80, 50, 50, 30, 70]), &weights), 50);
    }

    #[test]
    fn test_custom_weights() {
        let weights = DimensionWeights {
            sleep: 1.0,
            physical: 0.0,
            attention: 0.0,
            academic: 0.0,
            family: 0.0,
            social: 0.0,
        };
        assert_eq!(inverse_impact(&impacts([30, 90, 90, 90, 90, 90]), &weights), 70);
    }

    #[test]
    fn test_sentinel_follows_caller_decision() {
        let reference = ReferenceData::builtin();
        let weights = DimensionWeights::default();

        let calm = impacts([5, 10, 0, 3, 8, 2]);
        let aggregate = ImpactAggregator::aggregate(&calm, true, &weights, &reference);
        assert_eq!(aggregate.total_score, NO_IMPACT_SENTINEL);
        assert!(aggregate.below_average);

        let aggregate = ImpactAggregator::aggregate(&calm, false, &weights, &reference);
        assert!(aggregate.total_score < NO_IMPACT_SENTINEL);
        assert!(!aggregate.below_average);

        // Minute-driven moderate labels do not block the sentinel
        let teen_at_average = impacts([20, 48, 40, 32, 40, 15]);
        let aggregate = ImpactAggregator::aggregate(&teen_at_average, true, &weights, &reference);
        assert_eq!(aggregate.total_score, NO_IMPACT_SENTINEL);
    }

    #[test]
    fn test_no_adverse_impact_needs_both_conditions() {
        let mut input = NormalizedInput {
            child_age: 15,
            screen: ScreenMinutes {
                leisure: 240,
                school: 0,
                social: 0,
            },
            bedtime_device_use: BedtimeFrequency::Never,
            flags: BehavioralFlags {
                sleep_complaints: SignalLevel::Low,
                physical_inactivity: SignalLevel::None,
                attention_complaints: SignalLevel::None,
                academic_decline: SignalLevel::Low,
                family_disconnect: SignalLevel::None,
                social_withdrawal: SignalLevel::None,
            },
            adjustments: vec![],
        };

        assert!(no_adverse_impact(&input, true));
        assert!(!no_adverse_impact(&input, false));

        input.flags.family_disconnect = SignalLevel::Moderate;
        assert!(!no_adverse_impact(&input, true));

        input.flags.family_disconnect = SignalLevel::None;
        input.bedtime_device_use = BedtimeFrequency::Often;
        assert!(!no_adverse_impact(&input, true));
    }

    #[test]
    fn test_zero_scores_without_sentinel_cap_at_99() {
        let reference = ReferenceData::builtin();
        let aggregate = ImpactAggregator::aggregate(
            &impacts([0; 6]),
            false,
            &DimensionWeights::default(),
            &reference,
        );
        assert_eq!(aggregate.total_score, 99);
    }

    #[test]
    fn test_worst_dimension_tie_break() {
        // Attention and social tie at 70; attention has priority
        assert_eq!(
            worst_dimension(&impacts([10, 20, 70, 30, 40, 70])),
            Dimension::Attention
        );
        // All equal: sleep comes first
        assert_eq!(worst_dimension(&impacts([50; 6])), Dimension::Sleep);
        // Physical outranks academic on a tie
        assert_eq!(
            worst_dimension(&impacts([10, 60, 10, 60, 10, 10])),
            Dimension::Physical
        );
    }

    #[test]
    fn test_shock_phrase_names_worst_dimension() {
        let reference = ReferenceData::builtin();
        let phrase = shock_phrase(&impacts([85, 20, 30, 10, 10, 10]), &reference);

        assert_eq!(
            phrase,
            "Alerte : les écrans affectent sévèrement le sommeil de votre enfant (85/100)."
        );
    }

    #[test]
    fn test_shock_phrase_uses_label_template() {
        let reference = ReferenceData::builtin();
        let phrase = shock_phrase(&impacts([10, 20, 30, 10, 10, 12]), &reference);

        assert!(phrase.starts_with("Bonne nouvelle"));
        assert!(phrase.contains("l'attention et la concentration"));
        assert!(phrase.contains("30/100"));
    }
}
