//! Pipeline orchestration
//!
//! Provides the public API for impact calculation. Orchestrates the full
//! pipeline from a questionnaire submission to the assembled result:
//! normalize → score dimensions → aggregate + project → recommend.

use std::sync::OnceLock;

use log::debug;

use crate::aggregator::{self, ImpactAggregator};
use crate::config::EngineConfig;
use crate::encoder::{ImpactReport, ReportEncoder};
use crate::error::{ImpactError, ValidationError};
use crate::normalizer::SubmissionNormalizer;
use crate::recommendations::RecommendationSelector;
use crate::reference::ReferenceData;
use crate::scorers::DimensionScorer;
use crate::trajectory::TrajectoryProjector;
use crate::types::{ImpactResult, NormalizedInput, SimulationData};

static DEFAULT_ENGINE: OnceLock<ImpactEngine> = OnceLock::new();

/// Shared engine with the built-in configuration and catalog
pub(crate) fn default_engine() -> &'static ImpactEngine {
    DEFAULT_ENGINE.get_or_init(ImpactEngine::new)
}

/// Calculate the impact of a submission with the built-in configuration
/// and reference data (stateless, one-shot).
pub fn calculate_impact(data: &SimulationData) -> Result<ImpactResult, ImpactError> {
    default_engine().calculate(data)
}

/// Convert submission JSON to result JSON (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let result_json = simulation_to_impact_json(submission_json)?;
/// ```
pub fn simulation_to_impact_json(submission_json: String) -> Result<String, ImpactError> {
    default_engine().calculate_json(&submission_json)
}

/// Parse a submission, reporting malformed JSON as a validation failure
pub fn parse_submission(json: &str) -> Result<SimulationData, ImpactError> {
    serde_json::from_str(json)
        .map_err(|e| ImpactError::Validation(ValidationError::InvalidShape(e.to_string())))
}

/// Split a JSON document holding one submission or an array of them
///
/// Each element is returned as its own JSON text for [`parse_submission`].
/// A document that is not JSON, or is neither an object nor an array, is a
/// validation failure.
pub fn split_submissions(json: &str) -> Result<Vec<String>, ImpactError> {
    let invalid = |message: String| ImpactError::Validation(ValidationError::InvalidShape(message));
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
    match value {
        serde_json::Value::Array(items) => Ok(items.iter().map(|item| item.to_string()).collect()),
        serde_json::Value::Object(_) => Ok(vec![value.to_string()]),
        _ => Err(invalid(
            "expected a submission object or an array of submissions".to_string(),
        )),
    }
}

/// Impact engine holding its configuration and reference tables.
///
/// The engine keeps no per-call state: every calculation is independent and
/// identical inputs produce identical results.
#[derive(Debug, Clone)]
pub struct ImpactEngine {
    config: EngineConfig,
    reference: ReferenceData,
    encoder: ReportEncoder,
}

impl Default for ImpactEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpactEngine {
    /// Create an engine with the default configuration and built-in catalog
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            reference: ReferenceData::builtin(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create an engine with explicit configuration and reference data
    pub fn with_parts(config: EngineConfig, reference: ReferenceData) -> Result<Self, ImpactError> {
        config.validate()?;
        reference.validate()?;
        Ok(Self {
            config,
            reference,
            encoder: ReportEncoder::new(),
        })
    }

    /// Create an engine from JSON documents; `None` keeps the default part
    pub fn from_json(
        config_json: Option<&str>,
        reference_json: Option<&str>,
    ) -> Result<Self, ImpactError> {
        let config = match config_json {
            Some(json) => EngineConfig::from_json(json)?,
            None => EngineConfig::default(),
        };
        let reference = match reference_json {
            Some(json) => ReferenceData::from_json(json)?,
            None => ReferenceData::builtin(),
        };
        Self::with_parts(config, reference)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Validate and normalize a submission without scoring it
    pub fn normalize(&self, data: &SimulationData) -> Result<NormalizedInput, ImpactError> {
        Ok(SubmissionNormalizer::normalize(data)?)
    }

    /// Calculate the impact result for a submission
    pub fn calculate(&self, data: &SimulationData) -> Result<ImpactResult, ImpactError> {
        // Stage 1: Validate and normalize
        let input = self.normalize(data)?;
        debug!(
            "normalized submission: age {}, {} min/day, {} adjustment(s)",
            input.child_age,
            input.screen.total(),
            input.adjustments.len()
        );

        Ok(self.calculate_normalized(&input))
    }

    /// Run the scoring stages on already-normalized input (total function)
    pub fn calculate_normalized(&self, input: &NormalizedInput) -> ImpactResult {
        // Stage 2: Score dimensions
        let dimensions = DimensionScorer::score_all(input, &self.reference);
        debug!(
            "dimension scores: {}",
            dimensions
                .iter()
                .map(|(d, impact)| format!("{}={}", d.as_str(), impact.score))
                .collect::<Vec<_>>()
                .join(" ")
        );

        // Stage 3: Aggregate and project
        let at_or_below = TrajectoryProjector::at_or_below_average(input, &self.reference);
        let aggregate = ImpactAggregator::aggregate(
            &dimensions,
            aggregator::no_adverse_impact(input, at_or_below),
            &self.config.weights,
            &self.reference,
        );
        let comparison_data =
            TrajectoryProjector::project(input, &self.reference, &self.config.trajectory);
        debug!(
            "total score {} (below average: {})",
            aggregate.total_score, aggregate.below_average
        );

        // Stage 4: Recommend
        let recommendations = RecommendationSelector::select(
            &dimensions,
            &self.reference,
            self.config.recommendation_cap,
        );

        ImpactResult {
            total_score: aggregate.total_score,
            below_average: aggregate.below_average,
            dimensions,
            shock_phrase: aggregate.shock_phrase,
            comparison_data,
            recommendations,
        }
    }

    /// Calculate from submission JSON and return result JSON
    pub fn calculate_json(&self, submission_json: &str) -> Result<String, ImpactError> {
        let data = parse_submission(submission_json)?;
        let result = self.calculate(&data)?;
        serde_json::to_string(&result).map_err(ImpactError::JsonError)
    }

    /// Calculate and wrap the result in a report envelope
    pub fn report(&self, data: &SimulationData) -> Result<ImpactReport, ImpactError> {
        let result = self.calculate(data)?;
        Ok(self.encoder.encode(result, &self.reference))
    }

    /// Calculate from submission JSON and return report JSON
    pub fn report_json(&self, submission_json: &str) -> Result<String, ImpactError> {
        let data = parse_submission(submission_json)?;
        let report = self.report(&data)?;
        serde_json::to_string_pretty(&report).map_err(ImpactError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::NO_IMPACT_SENTINEL;
    use crate::config::DEFAULT_RECOMMENDATION_CAP;
    use crate::encoder::ComparisonVerdict;
    use crate::types::{
        BedtimeAnswer, BedtimeFrequency, ImpactLabel, RawBehavioralFlags, RawScreenMinutes,
        SignalLevel, MAX_CHILD_AGE, MIN_CHILD_AGE,
    };
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn submission(age: i64, leisure: i64, bedtime: bool, level: SignalLevel) -> SimulationData {
        SimulationData {
            child_age: Some(age),
            daily_screen_minutes: Some(RawScreenMinutes {
                leisure: Some(leisure),
                school: None,
                social: None,
            }),
            bedtime_device_use: Some(BedtimeAnswer::Flag(bedtime)),
            behavioral_flags: Some(RawBehavioralFlags::uniform(level)),
        }
    }

    const LEVELS: [SignalLevel; 5] = [
        SignalLevel::None,
        SignalLevel::Low,
        SignalLevel::Moderate,
        SignalLevel::High,
        SignalLevel::Severe,
    ];

    fn set_flag(flags: &mut RawBehavioralFlags, index: usize, level: SignalLevel) {
        let slot = match index {
            0 => &mut flags.sleep_complaints,
            1 => &mut flags.physical_inactivity,
            2 => &mut flags.attention_complaints,
            3 => &mut flags.academic_decline,
            4 => &mut flags.family_disconnect,
            _ => &mut flags.social_withdrawal,
        };
        *slot = Some(level);
    }

    fn sample_submission_json() -> &'static str {
        r#"{
            "childAge": 12,
            "dailyScreenMinutes": { "leisure": 150, "school": 45, "social": 60 },
            "bedtimeDeviceUse": "often",
            "behavioralFlags": {
                "sleepComplaints": "moderate",
                "physicalInactivity": "low",
                "attentionComplaints": "high",
                "academicDecline": "moderate",
                "familyDisconnect": "low",
                "socialWithdrawal": "none"
            }
        }"#
    }

    #[test]
    fn test_severe_scenario() {
        let result = calculate_impact(&submission(10, 240, true, SignalLevel::Severe)).unwrap();

        assert_eq!(result.dimensions.sleep_impact.label, ImpactLabel::Severe);
        assert_eq!(result.dimensions.attention_impact.label, ImpactLabel::Severe);
        assert!(result.total_score <= 10, "total {}", result.total_score);
        assert!(!result.below_average);
        assert!(result.shock_phrase.contains("le sommeil"));

        assert_eq!(result.recommendations.len(), 4);
        let unique: HashSet<&String> = result.recommendations.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_calm_scenario_hits_sentinel() {
        let result = calculate_impact(&submission(8, 20, false, SignalLevel::None)).unwrap();

        assert_eq!(result.total_score, NO_IMPACT_SENTINEL);
        assert!(result.below_average);
        for (_, impact) in result.dimensions.iter() {
            assert_eq!(impact.label, ImpactLabel::Low);
        }
    }

    #[test]
    fn test_zero_minutes_boundary() {
        let data = SimulationData {
            daily_screen_minutes: Some(RawScreenMinutes {
                leisure: Some(0),
                school: Some(0),
                social: Some(0),
            }),
            ..submission(14, 0, false, SignalLevel::None)
        };
        let result = calculate_impact(&data).unwrap();

        for (_, impact) in result.dimensions.iter() {
            assert_eq!(impact.score, 0);
        }
        assert_eq!(result.total_score, NO_IMPACT_SENTINEL);
    }

    #[test]
    fn test_scores_in_range_over_grid() {
        let engine = ImpactEngine::new();
        let levels = [
            SignalLevel::None,
            SignalLevel::Low,
            SignalLevel::Moderate,
            SignalLevel::High,
            SignalLevel::Severe,
        ];
        for age in [3, 9, 17] {
            for leisure in [-10, 0, 60, 300, 2000] {
                for level in levels {
                    for bedtime in [false, true] {
                        let result = engine
                            .calculate(&submission(age, leisure, bedtime, level))
                            .unwrap();
                        assert!(result.total_score <= 100);
                        for (_, impact) in result.dimensions.iter() {
                            assert!(impact.score <= 100);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_total_non_increasing_in_leisure_minutes() {
        let engine = ImpactEngine::new();
        for level in [SignalLevel::None, SignalLevel::Moderate, SignalLevel::Severe] {
            let mut previous = u8::MAX;
            for leisure in (0..=720).step_by(10) {
                let total = engine
                    .calculate(&submission(9, leisure, false, level))
                    .unwrap()
                    .total_score;
                assert!(total <= previous, "total rose at {leisure} minutes");
                previous = total;
            }
        }
    }

    #[test]
    fn test_total_non_increasing_in_bedtime_use() {
        let engine = ImpactEngine::new();
        let mut previous = u8::MAX;
        for frequency in [
            BedtimeFrequency::Never,
            BedtimeFrequency::Rarely,
            BedtimeFrequency::Sometimes,
            BedtimeFrequency::Often,
            BedtimeFrequency::Always,
        ] {
            let data = SimulationData {
                bedtime_device_use: Some(BedtimeAnswer::Frequency(frequency)),
                ..submission(11, 90, false, SignalLevel::Low)
            };
            let total = engine.calculate(&data).unwrap().total_score;
            assert!(total <= previous);
            previous = total;
        }
    }

    #[test]
    fn test_idempotent_output() {
        let engine = ImpactEngine::new();
        let first = engine.calculate_json(sample_submission_json()).unwrap();
        let second = engine.calculate_json(sample_submission_json()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_contract_keys() {
        let json = simulation_to_impact_json(sample_submission_json().to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(payload["totalScore"].is_u64());
        assert!(payload["belowAverage"].is_boolean());
        for key in [
            "sleepImpact",
            "physicalHealthImpact",
            "attentionImpact",
            "academicImpact",
            "familyImpact",
            "socialImpact",
        ] {
            assert!(payload[key]["score"].is_u64(), "{key} score");
            assert!(payload[key]["label"].is_string(), "{key} label");
            assert!(payload[key]["descriptor"].is_string(), "{key} descriptor");
        }
        assert!(payload["shockPhrase"].is_string());
        assert_eq!(payload["comparisonData"]["markerAge"], 12);

        let chart = payload["comparisonData"]["chartData"].as_array().unwrap();
        assert_eq!(chart.len(), 15);
        assert_eq!(chart[0]["age"], 3);
        assert!(chart[0]["enfant"].is_null());
        assert!(chart[9]["enfant"].is_number());

        let recommendations = payload["recommendations"].as_array().unwrap();
        assert_eq!(recommendations.len(), DEFAULT_RECOMMENDATION_CAP);
    }

    #[test]
    fn test_result_roundtrips_through_json() {
        let engine = ImpactEngine::new();
        let data = parse_submission(sample_submission_json()).unwrap();
        let result = engine.calculate(&data).unwrap();

        let json = serde_json::to_string(&result).unwrap();
        let decoded: ImpactResult = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_invalid_json_is_validation_error() {
        let err = simulation_to_impact_json("not valid json".to_string()).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(
            err,
            ImpactError::Validation(ValidationError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_wrong_shape_is_validation_error() {
        let json = r#"{ "childAge": "ten", "dailyScreenMinutes": { "leisure": 60 } }"#;
        let err = simulation_to_impact_json(json.to_string()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_field_surfaces() {
        let json = r#"{ "childAge": 9, "dailyScreenMinutes": { "leisure": 60 } }"#;
        let err = simulation_to_impact_json(json.to_string()).unwrap_err();
        assert!(err.to_string().contains("bedtimeDeviceUse"));
    }

    #[test]
    fn test_custom_cap_from_json_config() {
        let engine = ImpactEngine::from_json(Some(r#"{ "recommendation_cap": 6 }"#), None).unwrap();
        let data = parse_submission(sample_submission_json()).unwrap();
        let result = engine.calculate(&data).unwrap();
        assert_eq!(result.recommendations.len(), 6);
    }

    #[test]
    fn test_invalid_reference_rejected() {
        let mut reference = ReferenceData::builtin();
        reference.average_hours_by_age.clear();

        let err = ImpactEngine::with_parts(EngineConfig::default(), reference).unwrap_err();
        assert!(matches!(err, ImpactError::InvalidReference(_)));
    }

    #[test]
    fn test_report_wraps_result() {
        let engine = ImpactEngine::new();
        let json = engine.report_json(sample_submission_json()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["producer"]["name"], crate::PRODUCER_NAME);
        assert!(payload["result"]["totalScore"].is_u64());
        assert!(payload["summary"]["share"]["text"].is_string());
    }

    #[test]
    fn test_sentinel_at_or_below_average_for_every_age() {
        let engine = ImpactEngine::new();
        let reference = engine.reference();
        for age in MIN_CHILD_AGE..=MAX_CHILD_AGE {
            let average_minutes = (reference.average_hours_at(age) * 60.0).round() as i64;
            let mut minutes = vec![0, (average_minutes - 1).max(0)];
            // Odd ages sit on the curve's table points, where the average is a whole minute count
            if age % 2 == 1 {
                minutes.push(average_minutes);
            }
            for leisure in minutes {
                let data = submission(age as i64, leisure, false, SignalLevel::None);
                let input = engine.normalize(&data).unwrap();
                assert!(TrajectoryProjector::at_or_below_average(&input, reference));

                let report = engine.report(&data).unwrap();
                assert_eq!(
                    report.result.total_score, NO_IMPACT_SENTINEL,
                    "age {age}, {leisure} min"
                );
                assert!(report.result.below_average);
                assert_eq!(report.summary.verdict, ComparisonVerdict::Inferieur);
            }
        }
    }

    #[test]
    fn test_teen_at_typical_usage_reads_below_average() {
        // 4 h/day at 15 sits under the 4.8 h average
        let report = ImpactEngine::new()
            .report(&submission(15, 240, false, SignalLevel::None))
            .unwrap();

        assert_eq!(report.result.total_score, NO_IMPACT_SENTINEL);
        assert_eq!(report.summary.verdict, ComparisonVerdict::Inferieur);
        assert_eq!(report.summary.verdict.as_str(), "INFÉRIEUR");

        // Same teen, one moderate signal: ordinary score, above-average verdict
        let mut data = submission(15, 240, false, SignalLevel::None);
        if let Some(flags) = data.behavioral_flags.as_mut() {
            flags.attention_complaints = Some(SignalLevel::Moderate);
        }
        let report = ImpactEngine::new().report(&data).unwrap();
        assert!(report.result.total_score < NO_IMPACT_SENTINEL);
        assert!(!report.result.below_average);
        assert_eq!(report.summary.verdict, ComparisonVerdict::Superieur);
    }

    #[test]
    fn test_low_flags_keep_sentinel() {
        let result = calculate_impact(&submission(8, 20, false, SignalLevel::Low)).unwrap();

        assert_eq!(result.total_score, NO_IMPACT_SENTINEL);
        assert!(result.below_average);
    }

    #[test]
    fn test_total_non_increasing_in_each_flag() {
        let engine = ImpactEngine::new();
        for index in 0..6 {
            for (age, leisure) in [(8, 20), (15, 240), (10, 400)] {
                let mut previous = u8::MAX;
                for level in LEVELS {
                    let mut data = submission(age, leisure, false, SignalLevel::None);
                    if let Some(flags) = data.behavioral_flags.as_mut() {
                        set_flag(flags, index, level);
                    }
                    let total = engine.calculate(&data).unwrap().total_score;
                    assert!(
                        total <= previous,
                        "flag {index} at {level:?} raised the total (age {age})"
                    );
                    previous = total;
                }
            }
        }
    }

    #[test]
    fn test_total_non_increasing_in_school_and_social_minutes() {
        let engine = ImpactEngine::new();
        for level in [SignalLevel::None, SignalLevel::Low, SignalLevel::High] {
            let mut previous_school = u8::MAX;
            let mut previous_social = u8::MAX;
            for minutes in (0..=600).step_by(20) {
                let mut school = submission(12, 60, false, level);
                school.daily_screen_minutes = Some(RawScreenMinutes {
                    leisure: Some(60),
                    school: Some(minutes),
                    social: Some(0),
                });
                let total = engine.calculate(&school).unwrap().total_score;
                assert!(total <= previous_school, "school {minutes} min raised the total");
                previous_school = total;

                let mut social = submission(12, 60, false, level);
                social.daily_screen_minutes = Some(RawScreenMinutes {
                    leisure: Some(60),
                    school: Some(0),
                    social: Some(minutes),
                });
                let total = engine.calculate(&social).unwrap().total_score;
                assert!(total <= previous_social, "social {minutes} min raised the total");
                previous_social = total;
            }
        }
    }

    #[test]
    fn test_one_shot_calls_share_default_engine() {
        assert!(std::ptr::eq(default_engine(), default_engine()));

        let data = submission(9, 90, true, SignalLevel::Moderate);
        assert_eq!(
            calculate_impact(&data).unwrap(),
            ImpactEngine::new().calculate(&data).unwrap()
        );
    }

    #[test]
    fn test_split_submissions_accepts_object_or_array() {
        let single = split_submissions(sample_submission_json()).unwrap();
        assert_eq!(single.len(), 1);
        assert!(parse_submission(&single[0]).is_ok());

        let batch = format!("[{0}, {0}]", sample_submission_json());
        assert_eq!(split_submissions(&batch).unwrap().len(), 2);
    }

    #[test]
    fn test_split_submissions_malformed_is_validation_error() {
        for json in ["{ not json", "42"] {
            let err = split_submissions(json).unwrap_err();
            assert!(matches!(
                err,
                ImpactError::Validation(ValidationError::InvalidShape(_))
            ));
        }
    }
}
