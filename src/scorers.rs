//! Dimension scoring
//!
//! Six independent scorers, one per impact dimension. Each reads only the
//! answers relevant to its dimension and sums bounded increments:
//!
//! ```text
//! score = clamp(round(Σ increment_i), 0, 100)
//! increment = points_per_level × level          (ordinal answers, level 0-4)
//!           | min(cap, minutes / minutes_per_point)  (screen time)
//! ```
//!
//! Every increment is non-negative and non-decreasing in its signal, so each
//! score is monotonic in every adverse answer.

use crate::reference::ReferenceData;
use crate::types::{Dimension, DimensionImpact, DimensionImpacts, ImpactLabel, NormalizedInput};

/// Scorer for the six impact dimensions
pub struct DimensionScorer;

impl DimensionScorer {
    /// Score every dimension (sequentially; the scorers share no state)
    pub fn score_all(input: &NormalizedInput, reference: &ReferenceData) -> DimensionImpacts {
        DimensionImpacts {
            sleep_impact: score_sleep(input, reference),
            physical_health_impact: score_physical(input, reference),
            attention_impact: score_attention(input, reference),
            academic_impact: score_academic(input, reference),
            family_impact: score_family(input, reference),
            social_impact: score_social(input, reference),
        }
    }
}

/// Sleep
///
/// ```text
/// 10 × bedtime device use + 10 × sleep complaints
///   + min(20, (leisure + social) / 12)
/// ```
pub fn score_sleep(input: &NormalizedInput, reference: &ReferenceData) -> DimensionImpact {
    let score = ordinal_points(input.bedtime_device_use.level(), 10.0)
        + ordinal_points(input.flags.sleep_complaints.level(), 10.0)
        + minute_points(input.screen.recreational(), 12.0, 20.0);
    build_impact(Dimension::Sleep, score, reference)
}

/// Physical health
///
/// ```text
/// 15 × physical inactivity + min(40, total minutes / 6)
/// ```
///
/// School screen time counts here: it is sedentary regardless of purpose.
pub fn score_physical(input: &NormalizedInput, reference: &ReferenceData) -> DimensionImpact {
    let score = ordinal_points(input.flags.physical_inactivity.level(), 15.0)
        + minute_points(input.screen.total(), 6.0, 40.0);
    build_impact(Dimension::Physical, score, reference)
}

/// Attention
///
/// ```text
/// 12 × attention complaints + min(40, (leisure + social) / 6)
///   + 3 × bedtime device use
/// ```
pub fn score_attention(input: &NormalizedInput, reference: &ReferenceData) -> DimensionImpact {
    let score = ordinal_points(input.flags.attention_complaints.level(), 12.0)
        + minute_points(input.screen.recreational(), 6.0, 40.0)
        + ordinal_points(input.bedtime_device_use.level(), 3.0);
    build_impact(Dimension::Attention, score, reference)
}

/// Academic
///
/// ```text
/// 12 × academic decline + min(32, leisure / 7.5) + 5 × bedtime device use
/// ```
pub fn score_academic(input: &NormalizedInput, reference: &ReferenceData) -> DimensionImpact {
    let score = ordinal_points(input.flags.academic_decline.level(), 12.0)
        + minute_points(input.screen.leisure, 7.5, 32.0)
        + ordinal_points(input.bedtime_device_use.level(), 5.0);
    build_impact(Dimension::Academic, score, reference)
}

/// Family
///
/// ```text
/// 15 × family disconnect + min(40, (leisure + social) / 6)
/// ```
pub fn score_family(input: &NormalizedInput, reference: &ReferenceData) -> DimensionImpact {
    let score = ordinal_points(input.flags.family_disconnect.level(), 15.0)
        + minute_points(input.screen.recreational(), 6.0, 40.0);
    build_impact(Dimension::Family, score, reference)
}

/// Social
///
/// ```text
/// 15 × social withdrawal + min(25, social / 4) + min(15, leisure / 16)
/// ```
pub fn score_social(input: &NormalizedInput, reference: &ReferenceData) -> DimensionImpact {
    let score = ordinal_points(input.flags.social_withdrawal.level(), 15.0)
        + minute_points(input.screen.social, 4.0, 25.0)
        + minute_points(input.screen.leisure, 16.0, 15.0);
    build_impact(Dimension::Social, score, reference)
}

fn ordinal_points(level: u8, points_per_level: f64) -> f64 {
    level as f64 * points_per_level
}

fn minute_points(minutes: u32, minutes_per_point: f64, cap: f64) -> f64 {
    (minutes as f64 / minutes_per_point).clamp(0.0, cap)
}

fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

fn build_impact(
    dimension: Dimension,
    raw: f64,
    reference: &ReferenceData,
) -> DimensionImpact {
    let score = clamp_score(raw);
    let label = ImpactLabel::from_score(score);
    DimensionImpact {
        score,
        label,
        descriptor: reference.descriptor(dimension, label).to_string(),
    }
}
