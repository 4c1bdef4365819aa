//! Core types for the screen impact engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: the raw questionnaire submission, the normalized input, per-dimension
//! impacts, and the assembled result consumed by the UI.

use serde::{Deserialize, Serialize};

/// Youngest age the questionnaire covers
pub const MIN_CHILD_AGE: u8 = 3;

/// Oldest age the questionnaire covers
pub const MAX_CHILD_AGE: u8 = 17;

/// Upper bound for any per-context daily minutes (a full day)
pub const MAX_DAILY_MINUTES: u32 = 1440;

/// Ordinal severity of an adverse behavioral signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    None,
    Low,
    Moderate,
    High,
    Severe,
}

impl SignalLevel {
    /// Ordinal position (0 = none, 4 = severe)
    pub fn level(self) -> u8 {
        match self {
            SignalLevel::None => 0,
            SignalLevel::Low => 1,
            SignalLevel::Moderate => 2,
            SignalLevel::High => 3,
            SignalLevel::Severe => 4,
        }
    }
}

/// How often a device is used in bed before sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedtimeFrequency {
    Never,
    Rarely,
    Sometimes,
    Often,
    Always,
}

impl BedtimeFrequency {
    /// Ordinal position (0 = never, 4 = always)
    pub fn level(self) -> u8 {
        match self {
            BedtimeFrequency::Never => 0,
            BedtimeFrequency::Rarely => 1,
            BedtimeFrequency::Sometimes => 2,
            BedtimeFrequency::Often => 3,
            BedtimeFrequency::Always => 4,
        }
    }
}

/// Bedtime answer as submitted: the short form is a yes/no toggle,
/// the long form asks for a frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BedtimeAnswer {
    Flag(bool),
    Frequency(BedtimeFrequency),
}

impl BedtimeAnswer {
    pub fn to_frequency(self) -> BedtimeFrequency {
        match self {
            BedtimeAnswer::Flag(true) => BedtimeFrequency::Always,
            BedtimeAnswer::Flag(false) => BedtimeFrequency::Never,
            BedtimeAnswer::Frequency(frequency) => frequency,
        }
    }
}

/// Daily screen minutes by context, as submitted (unchecked)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScreenMinutes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leisure: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<i64>,
}

/// Behavioral answers, as submitted (unchecked)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBehavioralFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_complaints: Option<SignalLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_inactivity: Option<SignalLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention_complaints: Option<SignalLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_decline: Option<SignalLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_disconnect: Option<SignalLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_withdrawal: Option<SignalLevel>,
}

impl RawBehavioralFlags {
    /// Every signal set to the same level
    pub fn uniform(level: SignalLevel) -> Self {
        Self {
            sleep_complaints: Some(level),
            physical_inactivity: Some(level),
            attention_complaints: Some(level),
            academic_decline: Some(level),
            family_disconnect: Some(level),
            social_withdrawal: Some(level),
        }
    }
}

/// A completed questionnaire submission
///
/// Every field is optional on the wire so that absence is reported by the
/// normalizer with the field's path rather than by the deserializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_screen_minutes: Option<RawScreenMinutes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedtime_device_use: Option<BedtimeAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavioral_flags: Option<RawBehavioralFlags>,
}

/// Daily screen minutes by context, clamped to `[0, MAX_DAILY_MINUTES]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenMinutes {
    pub leisure: u32,
    pub school: u32,
    pub social: u32,
}

impl ScreenMinutes {
    /// Minutes across every context
    pub fn total(&self) -> u32 {
        self.leisure + self.school + self.social
    }

    /// Leisure and social minutes (school use excluded)
    pub fn recreational(&self) -> u32 {
        self.leisure + self.social
    }

    pub fn total_hours(&self) -> f64 {
        self.total() as f64 / 60.0
    }
}

/// Behavioral signals after validation; higher levels are always more adverse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehavioralFlags {
    pub sleep_complaints: SignalLevel,
    pub physical_inactivity: SignalLevel,
    pub attention_complaints: SignalLevel,
    pub academic_decline: SignalLevel,
    pub family_disconnect: SignalLevel,
    pub social_withdrawal: SignalLevel,
}

impl BehavioralFlags {
    /// Most adverse of the six signals
    pub fn max_level(&self) -> SignalLevel {
        [
            self.sleep_complaints,
            self.physical_inactivity,
            self.attention_complaints,
            self.academic_decline,
            self.family_disconnect,
            self.social_withdrawal,
        ]
        .into_iter()
        .max()
        .unwrap_or(SignalLevel::None)
    }
}

/// Highest signal level that still reads as "nothing reported"
pub const QUIET_SIGNAL_LEVEL: SignalLevel = SignalLevel::Low;

/// Highest bedtime use that still reads as "nothing reported"
pub const QUIET_BEDTIME_USE: BedtimeFrequency = BedtimeFrequency::Rarely;

/// A clamp the normalizer applied to an out-of-domain value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationAdjustment {
    pub field: String,
    pub original: i64,
    pub applied: i64,
}

/// Questionnaire answers in their scoring domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedInput {
    pub child_age: u8,
    pub screen: ScreenMinutes,
    pub bedtime_device_use: BedtimeFrequency,
    pub flags: BehavioralFlags,
    pub adjustments: Vec<NormalizationAdjustment>,
}

impl NormalizedInput {
    /// Whether the parent reported anything beyond low signals or rare bedtime use
    pub fn has_adverse_answers(&self) -> bool {
        self.flags.max_level() > QUIET_SIGNAL_LEVEL || self.bedtime_device_use > QUIET_BEDTIME_USE
    }
}

/// One of the six impact dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Sleep,
    Attention,
    Physical,
    Academic,
    Family,
    Social,
}

impl Dimension {
    /// Fixed tie-break order used wherever dimensions are ranked
    pub const PRIORITY: [Dimension; 6] = [
        Dimension::Sleep,
        Dimension::Attention,
        Dimension::Physical,
        Dimension::Academic,
        Dimension::Family,
        Dimension::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Sleep => "sleep",
            Dimension::Attention => "attention",
            Dimension::Physical => "physical",
            Dimension::Academic => "academic",
            Dimension::Family => "family",
            Dimension::Social => "social",
        }
    }

    /// Noun phrase naming the dimension inside a sentence
    pub fn subject(&self) -> &'static str {
        match self {
            Dimension::Sleep => "le sommeil",
            Dimension::Attention => "l'attention et la concentration",
            Dimension::Physical => "la santé physique",
            Dimension::Academic => "les résultats scolaires",
            Dimension::Family => "le lien familial",
            Dimension::Social => "les relations sociales et l'estime de soi",
        }
    }

    /// Position in `PRIORITY` (0 = highest priority)
    pub fn priority(&self) -> usize {
        match self {
            Dimension::Sleep => 0,
            Dimension::Attention => 1,
            Dimension::Physical => 2,
            Dimension::Academic => 3,
            Dimension::Family => 4,
            Dimension::Social => 5,
        }
    }
}

/// Lower bound of the moderate band
pub const MODERATE_THRESHOLD: u8 = 40;
/// Lower bound of the high band
pub const HIGH_THRESHOLD: u8 = 60;
/// Lower bound of the severe band
pub const SEVERE_THRESHOLD: u8 = 80;

/// Qualitative band of a dimension score, shared by every dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLabel {
    Low,
    Moderate,
    High,
    Severe,
}

impl ImpactLabel {
    pub const ALL: [ImpactLabel; 4] = [
        ImpactLabel::Low,
        ImpactLabel::Moderate,
        ImpactLabel::High,
        ImpactLabel::Severe,
    ];

    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= SEVERE_THRESHOLD => ImpactLabel::Severe,
            s if s >= HIGH_THRESHOLD => ImpactLabel::High,
            s if s >= MODERATE_THRESHOLD => ImpactLabel::Moderate,
            _ => ImpactLabel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLabel::Low => "low",
            ImpactLabel::Moderate => "moderate",
            ImpactLabel::High => "high",
            ImpactLabel::Severe => "severe",
        }
    }
}

/// Severity of one dimension (0 = no impact, 100 = maximal impact)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionImpact {
    pub score: u8,
    pub label: ImpactLabel,
    pub descriptor: String,
}

/// The six dimension impacts, keyed by the names the UI reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionImpacts {
    pub sleep_impact: DimensionImpact,
    pub physical_health_impact: DimensionImpact,
    pub attention_impact: DimensionImpact,
    pub academic_impact: DimensionImpact,
    pub family_impact: DimensionImpact,
    pub social_impact: DimensionImpact,
}

impl DimensionImpacts {
    pub fn get(&self, dimension: Dimension) -> &DimensionImpact {
        match dimension {
            Dimension::Sleep => &self.sleep_impact,
            Dimension::Attention => &self.attention_impact,
            Dimension::Physical => &self.physical_health_impact,
            Dimension::Academic => &self.academic_impact,
            Dimension::Family => &self.family_impact,
            Dimension::Social => &self.social_impact,
        }
    }

    /// Dimensions paired with their impact, in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &DimensionImpact)> {
        Dimension::PRIORITY.into_iter().map(move |d| (d, self.get(d)))
    }

    /// Dimensions by descending score, ties resolved by `Dimension::PRIORITY`
    pub fn ranked(&self) -> Vec<Dimension> {
        let mut ranked = Dimension::PRIORITY.to_vec();
        // Stable sort keeps priority order among equal scores
        ranked.sort_by(|a, b| self.get(*b).score.cmp(&self.get(*a).score));
        ranked
    }
}

/// One age on the comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub age: u8,
    /// National average, hours per day
    pub moyenne: f64,
    /// Child's projected hours per day; null before the child's current age
    pub enfant: Option<f64>,
}

/// Age-by-age comparison between the national average and the child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonData {
    pub chart_data: Vec<ChartPoint>,
    /// Child's current age, the point highlighted on the chart
    pub marker_age: u8,
}

/// Complete engine output for one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    /// Inverse impact: 100 means no detected adverse impact
    pub total_score: u8,
    /// True exactly when `total_score` carries the 100 sentinel
    pub below_average: bool,
    #[serde(flatten)]
    pub dimensions: DimensionImpacts,
    pub shock_phrase: String,
    pub comparison_data: ComparisonData,
    pub recommendations: Vec<String>,
}
