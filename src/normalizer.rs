//! Questionnaire normalization
//!
//! Validates a raw submission and converts it into the typed scoring domain.
//! Missing answers are rejected; numeric overflow is clamped and recorded.

use log::warn;

use crate::error::ValidationError;
use crate::types::{
    BehavioralFlags, NormalizationAdjustment, NormalizedInput, RawBehavioralFlags,
    RawScreenMinutes, ScreenMinutes, SignalLevel, SimulationData, MAX_CHILD_AGE,
    MAX_DAILY_MINUTES, MIN_CHILD_AGE,
};

/// Normalizer for questionnaire submissions
pub struct SubmissionNormalizer;

impl SubmissionNormalizer {
    /// Validate a submission and bring every answer into its declared domain
    pub fn normalize(raw: &SimulationData) -> Result<NormalizedInput, ValidationError> {
        let age = raw
            .child_age
            .ok_or_else(|| missing("childAge"))?;
        let child_age = validate_age(age)?;

        let minutes = raw
            .daily_screen_minutes
            .as_ref()
            .ok_or_else(|| missing("dailyScreenMinutes"))?;

        let bedtime_device_use = raw
            .bedtime_device_use
            .ok_or_else(|| missing("bedtimeDeviceUse"))?
            .to_frequency();

        let flags = raw
            .behavioral_flags
            .as_ref()
            .ok_or_else(|| missing("behavioralFlags"))?;
        let flags = require_flags(flags)?;

        let mut adjustments = Vec::new();
        let screen = normalize_minutes(minutes, &mut adjustments)?;

        Ok(NormalizedInput {
            child_age,
            screen,
            bedtime_device_use,
            flags,
            adjustments,
        })
    }
}

fn missing(path: &str) -> ValidationError {
    ValidationError::MissingField(path.to_string())
}

fn validate_age(age: i64) -> Result<u8, ValidationError> {
    if age < MIN_CHILD_AGE as i64 || age > MAX_CHILD_AGE as i64 {
        return Err(ValidationError::AgeOutOfRange {
            age,
            min: MIN_CHILD_AGE,
            max: MAX_CHILD_AGE,
        });
    }
    Ok(age as u8)
}

/// Leisure minutes are mandatory; school and social default to zero
fn normalize_minutes(
    raw: &RawScreenMinutes,
    adjustments: &mut Vec<NormalizationAdjustment>,
) -> Result<ScreenMinutes, ValidationError> {
    let leisure = raw
        .leisure
        .ok_or_else(|| missing("dailyScreenMinutes.leisure"))?;

    Ok(ScreenMinutes {
        leisure: clamp_minutes("dailyScreenMinutes.leisure", leisure, adjustments),
        school: clamp_minutes(
            "dailyScreenMinutes.school",
            raw.school.unwrap_or(0),
            adjustments,
        ),
        social: clamp_minutes(
            "dailyScreenMinutes.social",
            raw.social.unwrap_or(0),
            adjustments,
        ),
    })
}

fn clamp_minutes(
    field: &str,
    value: i64,
    adjustments: &mut Vec<NormalizationAdjustment>,
) -> u32 {
    let clamped = value.clamp(0, MAX_DAILY_MINUTES as i64);
    if clamped != value {
        warn!("clamped {field} from {value} to {clamped}");
        adjustments.push(NormalizationAdjustment {
            field: field.to_string(),
            original: value,
            applied: clamped,
        });
    }
    clamped as u32
}

fn require_flags(raw: &RawBehavioralFlags) -> Result<BehavioralFlags, ValidationError> {
    fn flag(value: Option<SignalLevel>, name: &str) -> Result<SignalLevel, ValidationError> {
        value.ok_or_else(|| missing(&format!("behavioralFlags.{name}")))
    }

    Ok(BehavioralFlags {
        sleep_complaints: flag(raw.sleep_complaints, "sleepComplaints")?,
        physical_inactivity: flag(raw.physical_inactivity, "physicalInactivity")?,
        attention_complaints: flag(raw.attention_complaints, "attentionComplaints")?,
        academic_decline: flag(raw.academic_decline, "academicDecline")?,
        family_disconnect: flag(raw.family_disconnect, "familyDisconnect")?,
        social_withdrawal: flag(raw.social_withdrawal, "socialWithdrawal")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BedtimeAnswer, BedtimeFrequency};
    use pretty_assertions::assert_eq;

    fn make_test_submission() -> SimulationData {
        SimulationData {
            child_age: Some(10),
            daily_screen_minutes: Some(RawScreenMinutes {
                leisure: Some(120),
                school: Some(30),
                social: Some(45),
            }),
            bedtime_device_use: Some(BedtimeAnswer::Flag(true)),
            behavioral_flags: Some(RawBehavioralFlags::uniform(SignalLevel::Moderate)),
        }
    }

    #[test]
    fn test_normalize_valid_submission() {
        let normalized = SubmissionNormalizer::normalize(&make_test_submission()).unwrap();

        assert_eq!(normalized.child_age, 10);
        assert_eq!(
            normalized.screen,
            ScreenMinutes {
                leisure: 120,
                school: 30,
                social: 45
            }
        );
        assert_eq!(normalized.bedtime_device_use, BedtimeFrequency::Always);
        assert_eq!(normalized.flags.academic_decline, SignalLevel::Moderate);
        assert!(normalized.adjustments.is_empty());
    }

    #[test]
    fn test_missing_age_rejected() {
        let mut submission = make_test_submission();
        submission.child_age = None;

        let err = SubmissionNormalizer::normalize(&submission).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("childAge".to_string()));
    }

    #[test]
    fn test_missing_flag_names_its_path() {
        let mut submission = make_test_submission();
        if let Some(flags) = submission.behavioral_flags.as_mut() {
            flags.family_disconnect = None;
        }

        let err = SubmissionNormalizer::normalize(&submission).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField("behavioralFlags.familyDisconnect".to_string())
        );
    }

    #[test]
    fn test_missing_leisure_rejected() {
        let mut submission = make_test_submission();
        submission.daily_screen_minutes = Some(RawScreenMinutes {
            leisure: None,
            school: Some(60),
            social: None,
        });

        let err = SubmissionNormalizer::normalize(&submission).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField("dailyScreenMinutes.leisure".to_string())
        );
    }

    #[test]
    fn test_optional_contexts_default_to_zero() {
        let mut submission = make_test_submission();
        submission.daily_screen_minutes = Some(RawScreenMinutes {
            leisure: Some(90),
            school: None,
            social: None,
        });

        let normalized = SubmissionNormalizer::normalize(&submission).unwrap();
        assert_eq!(normalized.screen.school, 0);
        assert_eq!(normalized.screen.social, 0);
        assert_eq!(normalized.screen.total(), 90);
    }

    #[test]
    fn test_age_out_of_range() {
        let mut submission = make_test_submission();
        submission.child_age = Some(2);
        assert!(matches!(
            SubmissionNormalizer::normalize(&submission),
            Err(ValidationError::AgeOutOfRange { age: 2, .. })
        ));

        submission.child_age = Some(18);
        assert!(SubmissionNormalizer::normalize(&submission).is_err());

        submission.child_age = Some(3);
        assert!(SubmissionNormalizer::normalize(&submission).is_ok());

        submission.child_age = Some(17);
        assert!(SubmissionNormalizer::normalize(&submission).is_ok());
    }

    #[test]
    fn test_minutes_are_clamped_and_recorded() {
        let mut submission = make_test_submission();
        submission.daily_screen_minutes = Some(RawScreenMinutes {
            leisure: Some(-30),
            school: Some(2000),
            social: Some(15),
        });

        let normalized = SubmissionNormalizer::normalize(&submission).unwrap();
        assert_eq!(normalized.screen.leisure, 0);
        assert_eq!(normalized.screen.school, MAX_DAILY_MINUTES);
        assert_eq!(normalized.screen.social, 15);

        assert_eq!(
            normalized.adjustments,
            vec![
                NormalizationAdjustment {
                    field: "dailyScreenMinutes.leisure".to_string(),
                    original: -30,
                    applied: 0,
                },
                NormalizationAdjustment {
                    field: "dailyScreenMinutes.school".to_string(),
                    original: 2000,
                    applied: 1440,
                },
            ]
        );
    }
}
